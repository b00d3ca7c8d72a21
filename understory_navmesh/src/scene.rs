// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene input: entities, their static colliders, and the [`Scene`] collaborator.

use glam::{Mat4, Vec3};

use crate::types::{CollisionGroups, EntityId};

/// One collision shape in collider-local space.
///
/// Every bounded shape carries a local `center` offset applied before the entity's
/// world transform.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColliderShape {
    /// Axis-aligned box of full edge lengths `size`.
    Box {
        /// Full edge lengths.
        size: Vec3,
        /// Local offset.
        center: Vec3,
    },
    /// Sphere.
    Sphere {
        /// Radius.
        radius: f32,
        /// Local offset.
        center: Vec3,
    },
    /// Y-aligned capsule; `length` is the distance between the two hemisphere centres.
    Capsule {
        /// Length of the cylindrical part.
        length: f32,
        /// Radius of the cylinder and caps.
        radius: f32,
        /// Local offset.
        center: Vec3,
    },
    /// Y-aligned cylinder centred on its local origin.
    Cylinder {
        /// Full height along Y.
        height: f32,
        /// Radius.
        radius: f32,
        /// Local offset.
        center: Vec3,
    },
    /// Y-aligned cone with its apex up, centred on its local origin.
    Cone {
        /// Full height along Y, base to apex.
        height: f32,
        /// Radius of the base.
        radius: f32,
        /// Local offset.
        center: Vec3,
    },
    /// Convex hull given as raw points and triangle indices into them.
    ConvexHull {
        /// Hull points.
        points: Vec<Vec3>,
        /// Triangle list indices into `points`.
        indices: Vec<u32>,
        /// Local offset.
        center: Vec3,
    },
    /// Unbounded plane: local points `p` with `dot(normal, p) == distance`.
    Plane {
        /// Plane normal, not necessarily unit length.
        normal: Vec3,
        /// Signed offset along the normal.
        distance: f32,
    },
    /// Several child shapes sharing the collider's transform.
    Compound(Vec<ColliderShape>),
}

impl ColliderShape {
    /// True for shapes with no finite extent.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Plane { .. })
    }

    /// True if this shape or any compound child is unbounded.
    pub fn contains_unbounded(&self) -> bool {
        match self {
            Self::Compound(children) => children.iter().any(Self::contains_unbounded),
            other => other.is_unbounded(),
        }
    }
}

/// Static collider attached to an entity.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaticCollider {
    /// Disabled colliders never block.
    pub enabled: bool,
    /// Triggers report overlaps but never block.
    pub is_trigger: bool,
    /// Groups this collider belongs to.
    pub group: CollisionGroups,
    /// Shapes in collider-local space.
    pub shapes: Vec<ColliderShape>,
}

impl Default for StaticCollider {
    fn default() -> Self {
        Self {
            enabled: true,
            is_trigger: false,
            group: CollisionGroups::default(),
            shapes: Vec::new(),
        }
    }
}

impl StaticCollider {
    /// An enabled, non-trigger collider in the default group.
    pub fn new(shapes: Vec<ColliderShape>) -> Self {
        Self {
            shapes,
            ..Self::default()
        }
    }

    /// Whether this collider contributes walkable geometry for a build over `groups`.
    pub fn is_blocking(&self, groups: CollisionGroups) -> bool {
        self.enabled && !self.is_trigger && self.group.intersects(groups) && !self.shapes.is_empty()
    }
}

/// A scene entity as seen by the builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    /// Stable identifier.
    pub id: EntityId,
    /// Local to world transform.
    pub world_transform: Mat4,
    /// Optional static collider.
    pub collider: Option<StaticCollider>,
}

impl Entity {
    /// Create an entity with a collider.
    pub fn new(id: impl Into<EntityId>, world_transform: Mat4, collider: StaticCollider) -> Self {
        Self {
            id: id.into(),
            world_transform,
            collider: Some(collider),
        }
    }

    /// The collider, if it blocks for a build over `groups`.
    pub fn blocking_collider(&self, groups: CollisionGroups) -> Option<&StaticCollider> {
        self.collider.as_ref().filter(|c| c.is_blocking(groups))
    }
}

/// Source of entities for a build.
///
/// World matrices are expected to be up to date; the builder never walks a hierarchy.
pub trait Scene {
    /// Every entity of the scene, in a stable order.
    fn entities(&self) -> Vec<Entity>;

    /// Entities whose collider blocks for a build over `groups`, in scene order.
    fn list_blocking_entities(&self, groups: CollisionGroups) -> Vec<Entity> {
        self.entities()
            .into_iter()
            .filter(|e| e.blocking_collider(groups).is_some())
            .collect()
    }
}

impl Scene for [Entity] {
    fn entities(&self) -> Vec<Entity> {
        self.to_vec()
    }
}

impl Scene for Vec<Entity> {
    fn entities(&self) -> Vec<Entity> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> ColliderShape {
        ColliderShape::Box {
            size: Vec3::ONE,
            center: Vec3::ZERO,
        }
    }

    #[test]
    fn blocking_filter_drops_non_blocking_colliders() {
        let mut disabled = StaticCollider::new(vec![cube()]);
        disabled.enabled = false;
        let mut trigger = StaticCollider::new(vec![cube()]);
        trigger.is_trigger = true;
        let mut other_group = StaticCollider::new(vec![cube()]);
        other_group.group = CollisionGroups::CUSTOM3;

        let scene = vec![
            Entity::new(1, Mat4::IDENTITY, StaticCollider::new(vec![cube()])),
            Entity::new(2, Mat4::IDENTITY, disabled),
            Entity::new(3, Mat4::IDENTITY, trigger),
            Entity::new(4, Mat4::IDENTITY, other_group),
            Entity::new(5, Mat4::IDENTITY, StaticCollider::new(Vec::new())),
            Entity {
                id: EntityId(6),
                world_transform: Mat4::IDENTITY,
                collider: None,
            },
        ];
        let groups = CollisionGroups::DEFAULT | CollisionGroups::STATIC;
        let ids: Vec<_> = scene
            .list_blocking_entities(groups)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, [EntityId(1)]);

        let all = scene.as_slice().list_blocking_entities(CollisionGroups::all());
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn compound_reports_nested_planes() {
        let plane = ColliderShape::Plane {
            normal: Vec3::Y,
            distance: 0.0,
        };
        let shape = ColliderShape::Compound(vec![cube(), ColliderShape::Compound(vec![plane])]);
        assert!(!shape.is_unbounded());
        assert!(shape.contains_unbounded());
        assert!(!cube().contains_unbounded());
    }
}
