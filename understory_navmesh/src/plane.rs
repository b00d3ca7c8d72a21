// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Unbounded planes and the finite quads that stand in for them once the scene
//! extent is known.

use glam::{Mat4, Vec3};

use crate::geometry::GeometryBatch;

/// World-space plane with a unit normal: points `p` with `dot(normal, p) == distance`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed distance from the origin along `normal`.
    pub distance: f32,
}

impl Plane {
    /// Create a plane, normalizing `normal`. Returns `None` for a zero or non-finite normal.
    pub fn new(normal: Vec3, distance: f32) -> Option<Self> {
        let len = normal.length();
        if !(len.is_finite() && len > 0.0 && distance.is_finite()) {
            return None;
        }
        Some(Self {
            normal: normal / len,
            distance: distance / len,
        })
    }

    /// Map a local plane into the space of `transform`.
    ///
    /// Returns `None` when the transform collapses the plane.
    pub fn transformed(&self, transform: &Mat4) -> Option<Self> {
        if transform.determinant() == 0.0 {
            return None;
        }
        let point = transform.transform_point3(self.closest_point_to_origin());
        let normal = transform
            .inverse()
            .transpose()
            .transform_vector3(self.normal)
            .normalize_or_zero();
        if normal == Vec3::ZERO {
            return None;
        }
        Self::new(normal, normal.dot(point))
    }

    /// The point of the plane nearest the origin.
    pub fn closest_point_to_origin(&self) -> Vec3 {
        self.normal * self.distance
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: Vec3) -> Vec3 {
        p - self.normal * (self.normal.dot(p) - self.distance)
    }

    /// A square of half edge `half_extent` lying in the plane, centred on the projection
    /// of `center`, wound so its face normal matches the plane normal.
    pub fn build_geometry(&self, center: Vec3, half_extent: f32) -> GeometryBatch {
        let origin = self.project(center);
        let (tangent, _) = self.normal.any_orthonormal_pair();
        let bitangent = self.normal.cross(tangent);
        let t = tangent * half_extent;
        let b = bitangent * half_extent;
        GeometryBatch::from_buffers(
            vec![origin - t - b, origin + t - b, origin + t + b, origin - t + b],
            vec![0, 1, 2, 0, 2, 3],
        )
    }
}
