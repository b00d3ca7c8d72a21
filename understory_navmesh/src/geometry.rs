// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Triangle buffers: local meshes, immutable world-space batches, and the accumulator
//! that concatenates them.

use glam::{Mat4, Vec3};
use understory_tiling::Aabb3D;

/// Local-space triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create a mesh from vertices and a triangle list.
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }
}

/// World-space triangles of one contribution, with their exact bounds.
///
/// Batches are immutable once built and shared by `Arc` between builds.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryBatch {
    /// Union of all vertex positions.
    pub bounds: Aabb3D,
    /// World-space positions.
    pub vertices: Vec<Vec3>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl Default for GeometryBatch {
    fn default() -> Self {
        Self::empty()
    }
}

impl GeometryBatch {
    /// A batch with no triangles and empty bounds.
    pub const fn empty() -> Self {
        Self {
            bounds: Aabb3D::EMPTY,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Build a batch from world-space buffers, computing its bounds.
    pub fn from_buffers(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let mut acc = GeometryAccumulator::new();
        acc.append_mesh(&Mat4::IDENTITY, &MeshData::new(vertices, indices));
        acc.into_batch()
    }

    /// True if the batch has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of whole triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Growable triangle buffer with running bounds.
///
/// Appending is index-rebasing concatenation, so appending batches `a`, `b`, `c` in any
/// grouping yields identical buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryAccumulator {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Aabb3D,
}

impl GeometryAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Index buffers are 32-bit; larger scenes are unsupported."
    )]
    fn base_index(&self) -> u32 {
        debug_assert!(
            u32::try_from(self.vertices.len()).is_ok(),
            "vertex count exceeds 32-bit index range"
        );
        self.vertices.len() as u32
    }

    /// Append a local-space mesh transformed by `transform`.
    ///
    /// Trailing indices that do not form a whole triangle are dropped, as are triangles
    /// referring to a vertex the mesh does not have.
    pub fn append_mesh(&mut self, transform: &Mat4, mesh: &MeshData) {
        let base = self.base_index();
        let whole = mesh.indices.len() - mesh.indices.len() % 3;
        if whole != mesh.indices.len() {
            log::warn!(
                "dropping {} trailing indices that do not form a triangle",
                mesh.indices.len() - whole
            );
        }
        self.vertices.reserve(mesh.vertices.len());
        for &v in &mesh.vertices {
            let p = transform.transform_point3(v);
            self.bounds = self.bounds.extend(p);
            self.vertices.push(p);
        }

        let vertex_count = mesh.vertices.len();
        let mut out_of_range = 0_usize;
        for tri in mesh.indices[..whole].chunks_exact(3) {
            if tri.iter().any(|&i| i as usize >= vertex_count) {
                out_of_range += 1;
                continue;
            }
            self.indices.extend(tri.iter().map(|&i| i + base));
        }
        if out_of_range > 0 {
            log::warn!(
                "dropping {out_of_range} triangles indexing past {vertex_count} vertices"
            );
        }
    }

    /// Append an already world-space batch.
    pub fn append_batch(&mut self, batch: &GeometryBatch) {
        let base = self.base_index();
        self.vertices.extend_from_slice(&batch.vertices);
        self.indices.extend(batch.indices.iter().map(|&i| i + base));
        self.bounds = self.bounds.union(batch.bounds);
    }

    /// Append everything from another accumulator.
    pub fn merge(&mut self, other: Self) {
        let base = self.base_index();
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
        self.bounds = self.bounds.union(other.bounds);
    }

    /// Running bounds of everything appended so far.
    pub fn bounds(&self) -> Aabb3D {
        self.bounds
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex positions so far.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle indices so far.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Freeze the buffers into a batch.
    pub fn into_batch(self) -> GeometryBatch {
        GeometryBatch {
            bounds: self.bounds,
            vertices: self.vertices,
            indices: self.indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(offset: f32) -> GeometryBatch {
        GeometryBatch::from_buffers(
            vec![
                Vec3::new(offset, 0.0, 0.0),
                Vec3::new(offset + 1.0, 0.0, 0.0),
                Vec3::new(offset, 0.0, 1.0),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn empty_accumulator_yields_empty_batch() {
        let batch = GeometryAccumulator::new().into_batch();
        assert!(batch.is_empty());
        assert!(batch.bounds.is_empty());
        assert_eq!(batch, GeometryBatch::empty());
    }

    #[test]
    fn append_mesh_transforms_and_rebases() {
        let mut acc = GeometryAccumulator::new();
        acc.append_batch(&tri(0.0));
        let quad = MeshData::new(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::Z,
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        acc.append_mesh(&Mat4::from_translation(Vec3::new(10.0, 2.0, 0.0)), &quad);
        assert_eq!(acc.vertex_count(), 7);
        assert_eq!(acc.triangle_count(), 3);
        assert_eq!(&acc.indices()[3..], &[3, 4, 5, 3, 5, 6]);
        assert_eq!(acc.vertices()[3], Vec3::new(10.0, 2.0, 0.0));
        assert_eq!(acc.bounds().min, Vec3::ZERO);
        assert_eq!(acc.bounds().max, Vec3::new(11.0, 2.0, 1.0));
    }

    #[test]
    fn bounds_are_exact_union_of_vertices() {
        let mut acc = GeometryAccumulator::new();
        acc.append_batch(&tri(-5.0));
        acc.append_batch(&tri(3.0));
        let batch = acc.into_batch();
        assert_eq!(
            batch.bounds,
            Aabb3D::from_points(batch.vertices.iter().copied())
        );
    }

    #[test]
    fn append_is_associative() {
        let (a, b, c) = (tri(0.0), tri(1.0), tri(2.0));

        let mut left = GeometryAccumulator::new();
        left.append_batch(&a);
        left.append_batch(&b);
        left.append_batch(&c);

        let mut bc = GeometryAccumulator::new();
        bc.append_batch(&b);
        bc.append_batch(&c);
        let mut right = GeometryAccumulator::new();
        right.append_batch(&a);
        right.merge(bc);

        assert_eq!(left.into_batch(), right.into_batch());
    }

    #[test]
    fn partial_triangles_are_dropped() {
        let mut acc = GeometryAccumulator::new();
        acc.append_mesh(
            &Mat4::IDENTITY,
            &MeshData::new(vec![Vec3::ZERO, Vec3::X, Vec3::Z], vec![0, 1, 2, 0, 1]),
        );
        assert_eq!(acc.indices(), &[0, 1, 2]);
        assert_eq!(acc.vertex_count(), 3);
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let mut acc = GeometryAccumulator::new();
        acc.append_batch(&tri(0.0));
        acc.append_mesh(
            &Mat4::IDENTITY,
            &MeshData::new(
                vec![Vec3::ZERO, Vec3::X, Vec3::Z],
                vec![0, 1, 7, 2, 1, 0, 3, 0, 1],
            ),
        );
        assert_eq!(acc.vertex_count(), 6);
        assert_eq!(acc.indices(), &[0, 1, 2, 5, 4, 3]);
        assert!(
            acc.indices()
                .iter()
                .all(|&i| (i as usize) < acc.vertex_count())
        );
    }
}
