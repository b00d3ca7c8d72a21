// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_tiling --heading-base-level=0

//! Understory Tiling: 3D bounding volumes mapped onto a regular XZ tile grid.
//!
//! Understory Tiling is the spatial vocabulary for incremental, tile-based rebuilds.
//!
//! - [`Aabb3D`] is an axis-aligned bounding box with an empty identity for union.
//! - [`TileGrid`] maps a box to the [`TileRange`] of tiles it overlaps, and clamps a
//!   scene box to a single tile's horizontal extent.
//! - [`Damage`] batches added/removed/moved boxes and turns them into a set of dirty tiles.
//!
//! Tiles partition the horizontal plane only. Height is carried through unchanged, so a
//! clamped tile box always spans the full vertical range of the scene.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use understory_tiling::{Aabb3D, Damage, TileCoord, TileGrid};
//!
//! let grid = TileGrid::new(32.0);
//!
//! // A box whose maximum lies exactly on a tile edge stays within one tile.
//! let b = Aabb3D::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(32.0, 4.0, 32.0));
//! let tiles: Vec<_> = grid.overlapping_tiles(&b).iter().collect();
//! assert_eq!(tiles, [TileCoord::new(0, 0)]);
//!
//! // Moving that box to the right dirties both its old and new tiles.
//! let moved = Aabb3D::new(Vec3::new(40.0, 0.0, 0.0), Vec3::new(50.0, 4.0, 10.0));
//! let damage = Damage { moved: vec![(b, moved)], ..Damage::default() };
//! let dirty = damage.tiles(&grid, 0.0);
//! assert_eq!(dirty.len(), 2);
//! assert!(dirty.contains(&TileCoord::new(1, 0)));
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs. Tile indices saturate at the `i32` range.

#![no_std]

extern crate alloc;

pub mod damage;
pub mod grid;
pub mod types;

pub use damage::Damage;
pub use grid::{TileCoord, TileGrid, TileRange};
pub use types::Aabb3D;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use glam::Vec3;

    #[test]
    fn clamped_tiles_cover_the_scene_footprint() {
        let grid = TileGrid::new(8.0);
        let scene = Aabb3D::new(Vec3::new(-3.0, -1.0, 2.0), Vec3::new(13.0, 6.0, 9.0));
        let clamped: Vec<_> = grid
            .overlapping_tiles(&scene)
            .iter()
            .filter_map(|c| grid.clamp_to_tile(&scene, c))
            .collect();
        assert_eq!(clamped.len(), 6);
        let merged = clamped.iter().copied().fold(Aabb3D::EMPTY, Aabb3D::union);
        assert_eq!(merged, scene);
        let area: f32 = clamped.iter().map(|b| b.size().x * b.size().z).sum();
        assert_eq!(area, 16.0 * 7.0);
    }
}
