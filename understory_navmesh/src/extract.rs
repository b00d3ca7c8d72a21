// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning collider shapes into world-space triangles.

use core::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec3};

use crate::geometry::{GeometryAccumulator, GeometryBatch, MeshData};
use crate::plane::Plane;
use crate::scene::ColliderShape;

/// Converts leaf collider shapes into geometry.
///
/// The build pipeline unrolls [`ColliderShape::Compound`] before calling either method,
/// so implementations only see leaf shapes.
pub trait GeometryExtractor {
    /// World-space triangles for a bounded shape, or `None` for unbounded or
    /// unsupported shapes.
    fn extract_triangles(&self, shape: &ColliderShape, transform: &Mat4)
    -> Option<GeometryBatch>;

    /// The world-space plane of an unbounded shape, or `None` for bounded shapes.
    fn defer_unbounded(&self, shape: &ColliderShape, transform: &Mat4) -> Option<Plane>;
}

/// Reference extractor for the primitive collider shapes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PrimitiveExtractor {
    /// Subdivisions around the vertical axis of round shapes.
    pub segments: u32,
    /// Subdivisions from pole to pole of spheres and capsules.
    pub rings: u32,
}

impl Default for PrimitiveExtractor {
    fn default() -> Self {
        Self {
            segments: 16,
            rings: 8,
        }
    }
}

impl PrimitiveExtractor {
    /// Create an extractor with the given sphere tessellation, clamped to a usable minimum.
    pub fn new(segments: u32, rings: u32) -> Self {
        Self {
            segments: segments.max(3),
            rings: rings.max(2),
        }
    }

    fn box_mesh(size: Vec3) -> MeshData {
        let h = size * 0.5;
        let vertices = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                )
            })
            .collect();
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        MeshData::new(vertices, indices)
    }

    /// Latitude rows given as (polar angle, vertical offset) pairs.
    fn ring_mesh(&self, rows: &[(f32, f32)], radius: f32) -> MeshData {
        let segments = self.segments.max(3);
        let mut vertices = Vec::with_capacity(rows.len() * segments as usize);
        for &(phi, y) in rows {
            let (sin_phi, cos_phi) = phi.sin_cos();
            for j in 0..segments {
                let theta = 2.0 * PI * j as f32 / segments as f32;
                let (sin_t, cos_t) = theta.sin_cos();
                vertices.push(Vec3::new(
                    radius * sin_phi * cos_t,
                    radius * cos_phi + y,
                    radius * sin_phi * sin_t,
                ));
            }
        }
        let mut indices = Vec::new();
        for row in 1..rows.len() {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Tessellation counts are small."
            )]
            let (top, bottom) = ((row as u32 - 1) * segments, row as u32 * segments);
            for j in 0..segments {
                let k = (j + 1) % segments;
                indices.extend([top + j, top + k, bottom + j, top + k, bottom + k, bottom + j]);
            }
        }
        MeshData::new(vertices, indices)
    }

    /// Close the ring of `segments` vertices starting at `ring` with a fan around `center`.
    fn cap(&self, mesh: &mut MeshData, ring: u32, center: Vec3, facing_up: bool) {
        let segments = self.segments.max(3);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Tessellation counts are small."
        )]
        let hub = mesh.vertices.len() as u32;
        mesh.vertices.push(center);
        for j in 0..segments {
            let (a, b) = (ring + j, ring + (j + 1) % segments);
            if facing_up {
                mesh.indices.extend([hub, b, a]);
            } else {
                mesh.indices.extend([hub, a, b]);
            }
        }
    }

    fn sphere_mesh(&self, radius: f32) -> MeshData {
        let rings = self.rings.max(2);
        let rows: Vec<_> = (0..=rings)
            .map(|i| (PI * i as f32 / rings as f32, 0.0))
            .collect();
        self.ring_mesh(&rows, radius)
    }

    fn capsule_mesh(&self, length: f32, radius: f32) -> MeshData {
        let half_rings = (self.rings / 2).max(1);
        let half_len = length * 0.5;
        let step = |i: u32| FRAC_PI_2 * i as f32 / half_rings as f32;
        let rows: Vec<_> = (0..=half_rings)
            .map(|i| (step(i), half_len))
            .chain((0..=half_rings).map(|i| (FRAC_PI_2 + step(i), -half_len)))
            .collect();
        self.ring_mesh(&rows, radius)
    }

    fn cylinder_mesh(&self, height: f32, radius: f32) -> MeshData {
        let half = height * 0.5;
        let mut mesh = self.ring_mesh(&[(FRAC_PI_2, half), (FRAC_PI_2, -half)], radius);
        self.cap(&mut mesh, 0, Vec3::new(0.0, half, 0.0), true);
        self.cap(&mut mesh, self.segments.max(3), Vec3::new(0.0, -half, 0.0), false);
        mesh
    }

    fn cone_mesh(&self, height: f32, radius: f32) -> MeshData {
        let half = height * 0.5;
        // The apex row has zero polar angle, collapsing it onto (0, half, 0).
        let mut mesh = self.ring_mesh(&[(0.0, half - radius), (FRAC_PI_2, -half)], radius);
        self.cap(&mut mesh, self.segments.max(3), Vec3::new(0.0, -half, 0.0), false);
        mesh
    }
}

impl GeometryExtractor for PrimitiveExtractor {
    fn extract_triangles(
        &self,
        shape: &ColliderShape,
        transform: &Mat4,
    ) -> Option<GeometryBatch> {
        let (mesh, center) = match shape {
            ColliderShape::Box { size, center } => (Self::box_mesh(*size), *center),
            ColliderShape::Sphere { radius, center } => (self.sphere_mesh(*radius), *center),
            ColliderShape::Capsule {
                length,
                radius,
                center,
            } => (self.capsule_mesh(*length, *radius), *center),
            ColliderShape::Cylinder {
                height,
                radius,
                center,
            } => (self.cylinder_mesh(*height, *radius), *center),
            ColliderShape::Cone {
                height,
                radius,
                center,
            } => (self.cone_mesh(*height, *radius), *center),
            ColliderShape::ConvexHull {
                points,
                indices,
                center,
            } => (MeshData::new(points.clone(), indices.clone()), *center),
            ColliderShape::Plane { .. } | ColliderShape::Compound(_) => return None,
        };
        let mut acc = GeometryAccumulator::new();
        acc.append_mesh(&(*transform * Mat4::from_translation(center)), &mesh);
        Some(acc.into_batch())
    }

    fn defer_unbounded(&self, shape: &ColliderShape, transform: &Mat4) -> Option<Plane> {
        let ColliderShape::Plane { normal, distance } = shape else {
            return None;
        };
        let plane = Plane::new(*normal, *distance).and_then(|p| p.transformed(transform));
        if plane.is_none() {
            log::warn!("skipping degenerate plane (normal {normal}, distance {distance})");
        }
        plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_is_closed_and_centred() {
        let e = PrimitiveExtractor::default();
        let shape = ColliderShape::Box {
            size: Vec3::new(2.0, 4.0, 6.0),
            center: Vec3::new(0.0, 2.0, 0.0),
        };
        let batch = e
            .extract_triangles(&shape, &Mat4::from_translation(Vec3::X * 10.0))
            .unwrap();
        assert_eq!(batch.vertices.len(), 8);
        assert_eq!(batch.triangle_count(), 12);
        assert_eq!(batch.bounds.min, Vec3::new(9.0, 0.0, -3.0));
        assert_eq!(batch.bounds.max, Vec3::new(11.0, 4.0, 3.0));
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let e = PrimitiveExtractor::new(12, 6);
        let center = Vec3::new(1.0, 2.0, 3.0);
        let shape = ColliderShape::Sphere {
            radius: 2.5,
            center,
        };
        let batch = e.extract_triangles(&shape, &Mat4::IDENTITY).unwrap();
        assert_eq!(batch.vertices.len(), 12 * 7);
        assert_eq!(batch.triangle_count(), 12 * 6 * 2);
        for v in &batch.vertices {
            assert!((v.distance(center) - 2.5).abs() < 1e-4);
        }
        assert!((batch.bounds.max.y - 4.5).abs() < 1e-4);
    }

    #[test]
    fn capsule_spans_length_plus_caps() {
        let e = PrimitiveExtractor::default();
        let shape = ColliderShape::Capsule {
            length: 2.0,
            radius: 0.5,
            center: Vec3::ZERO,
        };
        let batch = e.extract_triangles(&shape, &Mat4::IDENTITY).unwrap();
        assert!((batch.bounds.max.y - 1.5).abs() < 1e-5);
        assert!((batch.bounds.min.y + 1.5).abs() < 1e-5);
        assert!(batch.indices.iter().all(|&i| (i as usize) < batch.vertices.len()));
    }

    #[test]
    fn cylinder_is_capped_and_centred() {
        let e = PrimitiveExtractor::new(8, 4);
        let shape = ColliderShape::Cylinder {
            height: 3.0,
            radius: 1.0,
            center: Vec3::new(0.0, 1.5, 0.0),
        };
        let batch = e.extract_triangles(&shape, &Mat4::IDENTITY).unwrap();
        assert_eq!(batch.vertices.len(), 2 * 8 + 2);
        assert_eq!(batch.triangle_count(), 4 * 8);
        assert!(batch.bounds.min.y.abs() < 1e-5);
        assert!((batch.bounds.max.y - 3.0).abs() < 1e-5);
        assert!((batch.bounds.max.x - 1.0).abs() < 1e-5);
        assert!(batch.indices.iter().all(|&i| (i as usize) < batch.vertices.len()));

        // The top cap faces up.
        let up = batch
            .indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]].map(|i| batch.vertices[i as usize]))
            .filter(|&[a, b, c]| (b - a).cross(c - a).normalize_or_zero().y > 0.99)
            .count();
        assert_eq!(up, 8);
    }

    #[test]
    fn cone_narrows_to_its_apex() {
        let e = PrimitiveExtractor::new(8, 4);
        let shape = ColliderShape::Cone {
            height: 2.0,
            radius: 0.5,
            center: Vec3::ZERO,
        };
        let batch = e.extract_triangles(&shape, &Mat4::IDENTITY).unwrap();
        assert_eq!(batch.vertices.len(), 2 * 8 + 1);
        assert_eq!(batch.triangle_count(), 3 * 8);
        assert!((batch.bounds.max.y - 1.0).abs() < 1e-5);
        assert!((batch.bounds.min.y + 1.0).abs() < 1e-5);
        for v in batch.vertices.iter().filter(|v| v.y > 0.5) {
            assert!(v.x.abs() < 1e-5 && v.z.abs() < 1e-5);
        }
    }

    #[test]
    fn hull_uses_its_own_triangles() {
        let e = PrimitiveExtractor::default();
        let shape = ColliderShape::ConvexHull {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::Y],
            indices: vec![0, 1, 2, 0, 1, 3],
            center: Vec3::ZERO,
        };
        let batch = e.extract_triangles(&shape, &Mat4::IDENTITY).unwrap();
        assert_eq!(batch.indices, [0, 1, 2, 0, 1, 3]);
    }

    #[test]
    fn planes_are_deferred_not_extracted() {
        let e = PrimitiveExtractor::default();
        let plane = ColliderShape::Plane {
            normal: Vec3::Y,
            distance: 0.0,
        };
        let t = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        assert!(e.extract_triangles(&plane, &t).is_none());
        let deferred = e.defer_unbounded(&plane, &t).unwrap();
        assert!((deferred.distance - 5.0).abs() < 1e-5);

        let cube = ColliderShape::Box {
            size: Vec3::ONE,
            center: Vec3::ZERO,
        };
        assert!(e.defer_unbounded(&cube, &t).is_none());

        let broken = ColliderShape::Plane {
            normal: Vec3::ZERO,
            distance: 1.0,
        };
        assert!(e.defer_unbounded(&broken, &t).is_none());
    }
}
