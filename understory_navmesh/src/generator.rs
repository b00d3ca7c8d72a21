// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators at the edges of a build: tile generation and result persistence.

use glam::Vec3;
use understory_tiling::{Aabb3D, TileCoord};

use crate::cache::{NavMeshResult, TileData};
use crate::error::TileGenError;
use crate::settings::AgentSettings;

/// Turns scene triangles into the navigation data of one tile of one agent layer.
///
/// Tiles of one build may be generated concurrently, hence the `Sync` bound. Returning
/// an empty [`TileData`] means the tile has no walkable surface; it is then removed
/// from the result instead of stored.
pub trait TileGenerator: Sync {
    /// Generate tile `coord` for `agent` from the whole scene buffer, restricted to
    /// `tile_bounds`.
    fn generate(
        &self,
        agent: &AgentSettings,
        vertices: &[Vec3],
        indices: &[u32],
        tile_bounds: &Aabb3D,
        coord: TileCoord,
    ) -> Result<TileData, TileGenError>;
}

impl<F> TileGenerator for F
where
    F: Fn(&AgentSettings, &[Vec3], &[u32], &Aabb3D, TileCoord) -> Result<TileData, TileGenError>
        + Sync,
{
    fn generate(
        &self,
        agent: &AgentSettings,
        vertices: &[Vec3],
        indices: &[u32],
        tile_bounds: &Aabb3D,
        coord: TileCoord,
    ) -> Result<TileData, TileGenError> {
        self(agent, vertices, indices, tile_bounds, coord)
    }
}

/// Receives every committed result before it enters the build cache.
pub trait Persistence<K> {
    /// Store the result of building `target`.
    fn save(&mut self, target: &K, result: &NavMeshResult);
}

/// [`Persistence`] that stores nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoPersistence;

impl<K> Persistence<K> for NoPersistence {
    fn save(&mut self, _target: &K, _result: &NavMeshResult) {}
}
