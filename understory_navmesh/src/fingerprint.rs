// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-entity content fingerprints and the geometry they produced.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use hashbrown::HashMap;
use understory_tiling::Aabb3D;

use crate::geometry::GeometryBatch;
use crate::plane::Plane;
use crate::scene::{ColliderShape, Entity};
use crate::types::EntityId;

/// Canonical little-endian byte encoder over a blake3 hasher.
struct ContentHasher(blake3::Hasher);

impl ContentHasher {
    fn new() -> Self {
        Self(blake3::Hasher::new())
    }

    fn u8(&mut self, v: u8) {
        self.0.update(&[v]);
    }

    fn u16(&mut self, v: u16) {
        self.0.update(&v.to_le_bytes());
    }

    fn len(&mut self, n: usize) {
        self.0.update(&(n as u64).to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.0.update(&v.to_bits().to_le_bytes());
    }

    fn vec3(&mut self, v: Vec3) {
        for c in v.to_array() {
            self.f32(c);
        }
    }

    fn mat4(&mut self, m: &Mat4) {
        for c in m.to_cols_array() {
            self.f32(c);
        }
    }

    fn shape(&mut self, shape: &ColliderShape) {
        match shape {
            ColliderShape::Box { size, center } => {
                self.u8(1);
                self.vec3(*size);
                self.vec3(*center);
            }
            ColliderShape::Sphere { radius, center } => {
                self.u8(2);
                self.f32(*radius);
                self.vec3(*center);
            }
            ColliderShape::Capsule {
                length,
                radius,
                center,
            } => {
                self.u8(3);
                self.f32(*length);
                self.f32(*radius);
                self.vec3(*center);
            }
            ColliderShape::Cylinder {
                height,
                radius,
                center,
            } => {
                self.u8(7);
                self.f32(*height);
                self.f32(*radius);
                self.vec3(*center);
            }
            ColliderShape::Cone {
                height,
                radius,
                center,
            } => {
                self.u8(8);
                self.f32(*height);
                self.f32(*radius);
                self.vec3(*center);
            }
            ColliderShape::ConvexHull {
                points,
                indices,
                center,
            } => {
                self.u8(4);
                self.len(points.len());
                for p in points {
                    self.vec3(*p);
                }
                self.len(indices.len());
                for i in indices {
                    self.0.update(&i.to_le_bytes());
                }
                self.vec3(*center);
            }
            ColliderShape::Plane { normal, distance } => {
                self.u8(5);
                self.vec3(*normal);
                self.f32(*distance);
            }
            ColliderShape::Compound(children) => {
                self.u8(6);
                self.len(children.len());
                for child in children {
                    self.shape(child);
                }
            }
        }
    }

    fn finish(&self) -> u64 {
        let hash = self.0.finalize();
        let mut head = [0_u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }
}

/// Fingerprint of everything about `entity` that affects its walkable geometry.
///
/// Covers the world transform, the collider's group bits and every shape descriptor in
/// order. Any change to those inputs changes the hash, up to 64-bit collisions.
pub fn content_hash(entity: &Entity) -> u64 {
    let mut h = ContentHasher::new();
    h.mat4(&entity.world_transform);
    match &entity.collider {
        None => h.u8(0),
        Some(collider) => {
            h.u8(1);
            h.u16(collider.group.bits());
            h.len(collider.shapes.len());
            for shape in &collider.shapes {
                h.shape(shape);
            }
        }
    }
    h.finish()
}

/// What one entity contributed to a build.
#[derive(Clone, Debug, PartialEq)]
pub struct FingerprintEntry {
    /// The entity.
    pub entity_id: EntityId,
    /// [`content_hash`] at the time the geometry was extracted.
    pub content_hash: u64,
    /// Bounded world-space triangles.
    pub geometry: Arc<GeometryBatch>,
    /// World-space unbounded planes, resized against the scene bounds on every build.
    pub planes: Arc<[Plane]>,
}

impl FingerprintEntry {
    /// Bounds of the bounded geometry; empty for plane-only entities.
    pub fn bounds(&self) -> Aabb3D {
        self.geometry.bounds
    }

    /// Whether the entity carries unbounded planes.
    pub fn has_unbounded(&self) -> bool {
        !self.planes.is_empty()
    }
}

/// Fingerprints keyed by entity, one per blocking entity of a build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FingerprintTable {
    entries: HashMap<EntityId, FingerprintEntry>,
}

impl FingerprintTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing and returning any previous entry for the same entity.
    pub fn insert(&mut self, entry: FingerprintEntry) -> Option<FingerprintEntry> {
        self.entries.insert(entry.entity_id, entry)
    }

    /// Look up an entity.
    pub fn get(&self, id: &EntityId) -> Option<&FingerprintEntry> {
        self.entries.get(id)
    }

    /// Whether the table has an entry for `id`.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    /// Remove and return the entry for `id`.
    pub fn remove(&mut self, id: &EntityId) -> Option<FingerprintEntry> {
        self.entries.remove(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &FingerprintEntry> {
        self.entries.values()
    }

    /// Entity ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Union of all bounded geometry.
    pub fn bounds(&self) -> Aabb3D {
        self.iter().map(FingerprintEntry::bounds).fold(Aabb3D::EMPTY, Aabb3D::union)
    }
}
