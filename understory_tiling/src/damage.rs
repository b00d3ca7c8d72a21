// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched damage: the bounding volumes touched between two builds.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::grid::{TileCoord, TileGrid};
use crate::types::Aabb3D;

/// Batched damage summary between two builds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Damage {
    /// Bounds of geometry that did not exist before.
    pub added: Vec<Aabb3D>,
    /// Last known bounds of geometry that no longer exists.
    pub removed: Vec<Aabb3D>,
    /// Geometry that changed in place: (old, new).
    pub moved: Vec<(Aabb3D, Aabb3D)>,
}

impl Damage {
    /// True if no damage entries recorded.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }

    /// Every damaged region, old and new sides of moves included.
    pub fn regions(&self) -> impl Iterator<Item = Aabb3D> + '_ {
        self.added
            .iter()
            .copied()
            .chain(self.removed.iter().copied())
            .chain(self.moved.iter().flat_map(|(a, b)| [*a, *b]))
    }

    /// Union of all regions affected. Returns `None` if nothing non-empty was recorded.
    pub fn union(&self) -> Option<Aabb3D> {
        let u = self.regions().fold(Aabb3D::EMPTY, Aabb3D::union);
        (!u.is_empty()).then_some(u)
    }

    /// Append another batch to this one.
    pub fn extend(&mut self, other: Self) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.moved.extend(other.moved);
    }

    /// Tiles touched by any region after padding it by `pad` on X and Z.
    ///
    /// Regions are mapped one by one, so two far apart edits never pull in the tiles
    /// between them. Empty regions contribute nothing.
    pub fn tiles(&self, grid: &TileGrid, pad: f32) -> BTreeSet<TileCoord> {
        let mut out = BTreeSet::new();
        for region in self.regions() {
            let region = region.inflate_xz(pad);
            if region.is_empty() {
                continue;
            }
            out.extend(grid.overlapping_tiles(&region).iter());
        }
        out
    }
}
