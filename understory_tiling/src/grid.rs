// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Regular tile grid over the XZ plane.
//!
//! A [`TileGrid`] partitions the horizontal plane into square tiles of a fixed edge length.
//! Tile `(x, y)` covers world X in `[x * s, (x + 1) * s]` and world Z in `[y * s, (y + 1) * s]`.
//! Height is never partitioned: a tile spans whatever vertical range the scene has.

use core::fmt;

use glam::Vec3;
use kurbo::Rect;

use crate::types::Aabb3D;

/// Integer coordinate of one tile.
///
/// `x` is the column along world X and `y` the row along world Z. Ordering is
/// lexicographic on `(x, y)`, which gives tile maps a stable iteration order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileCoord {
    /// Column along world X.
    pub x: i32,
    /// Row along world Z.
    pub y: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive rectangle of tile coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileRange {
    /// Lowest column and row in the range.
    pub min: TileCoord,
    /// Highest column and row in the range (inclusive).
    pub max: TileCoord,
}

impl TileRange {
    /// A range containing no tiles.
    pub const EMPTY: Self = Self {
        min: TileCoord::new(0, 0),
        max: TileCoord::new(-1, -1),
    };

    /// Create an inclusive range.
    pub const fn new(min: TileCoord, max: TileCoord) -> Self {
        Self { min, max }
    }

    /// True if the range covers no tiles.
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y
    }

    /// Number of tiles in the range, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let w = i64::from(self.max.x) - i64::from(self.min.x) + 1;
        let h = i64::from(self.max.y) - i64::from(self.min.y) + 1;
        w.checked_mul(h)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(usize::MAX)
    }

    /// Whether `coord` lies inside the range.
    pub fn contains(&self, coord: TileCoord) -> bool {
        (self.min.x..=self.max.x).contains(&coord.x) && (self.min.y..=self.max.y).contains(&coord.y)
    }

    /// Iterate the covered tiles row by row.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + use<> {
        let Self { min, max } = *self;
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| TileCoord::new(x, y)))
    }
}

/// Maps bounding volumes onto a regular grid of square tiles.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileGrid {
    tile_size: f32,
}

impl TileGrid {
    /// Create a grid with the given tile edge length.
    ///
    /// The edge length must be finite and positive; callers validate settings first.
    pub fn new(tile_size: f32) -> Self {
        debug_assert!(
            tile_size.is_finite() && tile_size > 0.0,
            "tile size must be finite and positive"
        );
        Self { tile_size }
    }

    /// Tile edge length in world units.
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[inline]
    fn floor_to_i32(v: f32) -> i32 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Float to int casts saturate; out of range tiles clamp to the grid edge."
        )]
        let i = v as i32;
        if (i as f32) > v { i.saturating_sub(1) } else { i }
    }

    #[inline]
    fn ceil_to_i32(v: f32) -> i32 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Float to int casts saturate; out of range tiles clamp to the grid edge."
        )]
        let i = v as i32;
        if (i as f32) < v { i.saturating_add(1) } else { i }
    }

    /// The tile containing a world position. Points on an edge belong to the higher tile.
    pub fn tile_at(&self, p: Vec3) -> TileCoord {
        TileCoord::new(
            Self::floor_to_i32(p.x / self.tile_size),
            Self::floor_to_i32(p.z / self.tile_size),
        )
    }

    /// Tiles overlapped by `bounds` on the XZ plane.
    ///
    /// A maximum lying exactly on a tile edge does not spill into the next tile, and a
    /// degenerate box still maps to the single tile containing it. Empty boxes map to
    /// [`TileRange::EMPTY`].
    pub fn overlapping_tiles(&self, bounds: &Aabb3D) -> TileRange {
        if bounds.is_empty() {
            return TileRange::EMPTY;
        }
        let s = self.tile_size;
        let min = self.tile_at(bounds.min);
        let max = TileCoord::new(
            (Self::ceil_to_i32(bounds.max.x / s).saturating_sub(1)).max(min.x),
            (Self::ceil_to_i32(bounds.max.z / s).saturating_sub(1)).max(min.y),
        );
        TileRange::new(min, max)
    }

    /// XZ footprint of a tile, with world Z mapped to `y`.
    pub fn tile_rect(&self, coord: TileCoord) -> Rect {
        let s = f64::from(self.tile_size);
        let x0 = f64::from(coord.x) * s;
        let y0 = f64::from(coord.y) * s;
        Rect::new(x0, y0, x0 + s, y0 + s)
    }

    /// Restrict `scene` to the horizontal extent of one tile.
    ///
    /// X and Z are the overlap of the tile and the scene; Y is the scene's full height.
    /// Returns `None` when the tile lies outside the scene, or merely touches its edge
    /// while the scene has a non-zero extent on that axis.
    pub fn clamp_to_tile(&self, scene: &Aabb3D, coord: TileCoord) -> Option<Aabb3D> {
        if scene.is_empty() {
            return None;
        }
        let tile = self.tile_rect(coord);
        let footprint = scene.footprint();

        // `Rect::intersect` collapses disjoint rectangles onto an edge, so reject those first.
        let axis_ok = |lo: f64, hi: f64, scene_lo: f64, scene_hi: f64| {
            hi > lo || (hi == lo && scene_hi == scene_lo)
        };
        let x_ok = axis_ok(
            footprint.x0.max(tile.x0),
            footprint.x1.min(tile.x1),
            footprint.x0,
            footprint.x1,
        );
        let z_ok = axis_ok(
            footprint.y0.max(tile.y0),
            footprint.y1.min(tile.y1),
            footprint.y0,
            footprint.y1,
        );
        if !x_ok || !z_ok {
            return None;
        }

        let clamped = tile.intersect(footprint);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Both rectangles come from f32 values, so their overlap is exact in f32."
        )]
        let (x0, z0, x1, z1) = (
            clamped.x0 as f32,
            clamped.y0 as f32,
            clamped.x1 as f32,
            clamped.y1 as f32,
        );
        Some(Aabb3D::new(
            Vec3::new(x0, scene.min.y, z0),
            Vec3::new(x1, scene.max.y, z1),
        ))
    }
}
