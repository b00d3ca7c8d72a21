// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use glam::Vec3;
use kurbo::Rect;

/// Axis-aligned bounding box in 3D.
///
/// The empty box has `min = +inf` and `max = -inf` on every axis, which makes it the
/// identity element of [`Aabb3D::union`]. A box with `min == max` is degenerate but
/// not empty: it still occupies a point.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb3D {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for Aabb3D {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb3D {
    /// The empty box; identity for [`Aabb3D::union`].
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Create a new AABB from min/max corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A degenerate box enclosing exactly one point.
    pub const fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// The tightest box enclosing all points. Empty when the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, Self::extend)
    }

    /// Return true if the box is empty or inverted on any axis. Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        self.max.cmplt(self.min).any()
    }

    /// The smallest box enclosing both boxes.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow the box to include `p`.
    #[must_use]
    pub fn extend(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// The intersection of two boxes. Empty when they are disjoint.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Whether the boxes share at least one point (touching counts).
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersect(*other).is_empty()
    }

    /// Whether this box contains the point (boundary inclusive).
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// Center of the box. Meaningless for an empty box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths of the box, clamped to zero for empty boxes.
    pub fn size(&self) -> Vec3 {
        (self.max - self.min).max(Vec3::ZERO)
    }

    /// The largest edge length.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    /// Pad the box horizontally (X and Z) by `amount` on every side.
    ///
    /// Empty boxes stay empty.
    #[must_use]
    pub fn inflate_xz(self, amount: f32) -> Self {
        if self.is_empty() {
            return self;
        }
        let pad = Vec3::new(amount, 0.0, amount);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// The projection onto the XZ plane, with world X mapped to `x` and world Z to `y`.
    pub fn footprint(&self) -> Rect {
        Rect::new(
            f64::from(self.min.x),
            f64::from(self.min.z),
            f64::from(self.max.x),
            f64::from(self.max.z),
        )
    }
}
