// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-pass scene geometry collection.
//!
//! The first pass gathers bounded triangles per entity and sets unbounded planes aside.
//! Once the scene bounds are known, the second pass turns each plane into a finite quad
//! sized against them.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use understory_tiling::Aabb3D;

use crate::diff::{EntityState, SceneDiff};
use crate::extract::GeometryExtractor;
use crate::fingerprint::{FingerprintEntry, FingerprintTable};
use crate::geometry::{GeometryAccumulator, GeometryBatch};
use crate::plane::Plane;
use crate::scene::{ColliderShape, Entity};

/// Geometry of one build in progress.
#[derive(Debug)]
pub(crate) struct SceneGeometry {
    /// Fingerprints of this build, bounded geometry only.
    pub(crate) fingerprints: FingerprintTable,
    /// Every triangle of the scene.
    pub(crate) scene: GeometryAccumulator,
    /// Planes waiting for the scene bounds, in scene order.
    pub(crate) pending_unbounded: Vec<Plane>,
}

impl SceneGeometry {
    /// First pass: reuse unchanged entries, extract new and changed entities.
    pub(crate) fn collect(
        diff: &SceneDiff,
        entities: &[Entity],
        previous: &FingerprintTable,
        extractor: &dyn GeometryExtractor,
    ) -> Self {
        let mut fingerprints = FingerprintTable::new();
        let mut scene = GeometryAccumulator::new();
        let mut pending_unbounded = Vec::new();

        for delta in &diff.entities {
            let reused = match delta.state {
                EntityState::Unchanged => previous.get(&delta.id).cloned(),
                EntityState::New | EntityState::Changed => None,
            };
            let entry = match reused {
                Some(entry) => entry,
                None => {
                    let entity = &entities[delta.index];
                    let (geometry, planes) = extract_entity(entity, extractor);
                    FingerprintEntry {
                        entity_id: delta.id,
                        content_hash: delta.content_hash,
                        geometry: Arc::new(geometry),
                        planes: planes.into(),
                    }
                }
            };
            scene.append_batch(&entry.geometry);
            pending_unbounded.extend(entry.planes.iter().copied());
            fingerprints.insert(entry);
        }

        Self {
            fingerprints,
            scene,
            pending_unbounded,
        }
    }

    /// Union of all bounded geometry.
    pub(crate) fn bounded_bounds(&self) -> Aabb3D {
        self.scene.bounds()
    }

    /// Whether any plane is waiting to be resolved.
    pub(crate) fn has_unbounded(&self) -> bool {
        !self.pending_unbounded.is_empty()
    }

    /// A cube of one tile around the first plane, for scenes made only of planes.
    pub(crate) fn anchor_bounds(&self, tile_size: f32) -> Option<Aabb3D> {
        let plane = self.pending_unbounded.first()?;
        let p = plane.closest_point_to_origin();
        let half = Vec3::splat(tile_size * 0.5);
        Some(Aabb3D::new(p - half, p + half))
    }

    /// Second pass: append a quad for every pending plane, sized against `bounds`.
    ///
    /// With `absorb` set, the returned bounds grow vertically to cover each plane over
    /// the horizontal extent of `bounds`. Otherwise `bounds` is returned unchanged.
    pub(crate) fn resolve_unbounded(&mut self, bounds: Aabb3D, absorb: bool) -> Aabb3D {
        let center = bounds.center();
        let half_extent = bounds.max_extent();
        let mut resolved = bounds;
        for plane in self.pending_unbounded.drain(..) {
            let quad = plane.build_geometry(center, half_extent);
            self.scene.append_batch(&quad);
            if absorb {
                resolved = resolved.union(plane_over_footprint(&plane, &bounds));
            }
        }
        resolved
    }
}

/// Extract one entity's leaf shapes, unrolling compounds breadth first.
fn extract_entity(
    entity: &Entity,
    extractor: &dyn GeometryExtractor,
) -> (GeometryBatch, Vec<Plane>) {
    let mut acc = GeometryAccumulator::new();
    let mut planes = Vec::new();
    let Some(collider) = &entity.collider else {
        return (acc.into_batch(), planes);
    };
    let mut queue: VecDeque<&ColliderShape> = collider.shapes.iter().collect();
    while let Some(shape) = queue.pop_front() {
        match shape {
            ColliderShape::Compound(children) => queue.extend(children),
            leaf if leaf.is_unbounded() => {
                planes.extend(extractor.defer_unbounded(leaf, &entity.world_transform));
            }
            leaf => {
                if let Some(batch) = extractor.extract_triangles(leaf, &entity.world_transform) {
                    acc.append_batch(&batch);
                }
            }
        }
    }
    (acc.into_batch(), planes)
}

/// The part of `plane` above the XZ footprint of `bounds`, as a box.
///
/// Near-vertical planes carry no walkable area and contribute nothing.
fn plane_over_footprint(plane: &Plane, bounds: &Aabb3D) -> Aabb3D {
    let n = plane.normal;
    if n.y.abs() < 1e-4 {
        return Aabb3D::EMPTY;
    }
    let corners = [
        (bounds.min.x, bounds.min.z),
        (bounds.max.x, bounds.min.z),
        (bounds.min.x, bounds.max.z),
        (bounds.max.x, bounds.max.z),
    ];
    Aabb3D::from_points(
        corners
            .into_iter()
            .map(|(x, z)| Vec3::new(x, (plane.distance - n.x * x - n.z * z) / n.y, z)),
    )
}
