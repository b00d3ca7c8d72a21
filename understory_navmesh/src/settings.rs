// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build configuration.

use core::fmt;

use understory_tiling::Aabb3D;

use crate::types::CollisionGroups;

/// Dimensions and abilities of the agent the mesh is built for.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentSettings {
    /// Height of the agent.
    pub height: f32,
    /// Radius of the agent; dirty regions are padded by it horizontally.
    pub radius: f32,
    /// Maximum step height the agent can climb.
    pub max_climb: f32,
    /// Steepest walkable slope, in degrees.
    pub max_slope_degrees: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            height: 1.0,
            radius: 0.5,
            max_climb: 0.25,
            max_slope_degrees: 45.0,
        }
    }
}

/// Settings of a navigation mesh build.
///
/// Everything except [`cache_capacity`](Self::cache_capacity) feeds
/// [`settings_hash`](Self::settings_hash); changing any of it invalidates every tile.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildSettings {
    /// Edge length of a square tile in world units.
    pub tile_size: f32,
    /// Horizontal voxel size used by the tile generator.
    pub cell_size: f32,
    /// Vertical voxel size used by the tile generator.
    pub cell_height: f32,
    /// One navigation mesh layer is built per agent, in this order.
    pub agents: Vec<AgentSettings>,
    /// Only colliders in one of these groups block.
    pub included_groups: CollisionGroups,
    /// Fixed build bounds. When `None` the bounds of the scene geometry are used.
    pub bounds: Option<Aabb3D>,
    /// Number of build targets kept in the build cache.
    ///
    /// Builds do not read this; the owner of the cache applies it, typically through
    /// [`BuildCache::for_settings`](crate::BuildCache::for_settings).
    pub cache_capacity: usize,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            cell_size: 0.3,
            cell_height: 0.2,
            agents: vec![AgentSettings::default()],
            included_groups: CollisionGroups::all(),
            bounds: None,
            cache_capacity: 4,
        }
    }
}

/// Why a [`BuildSettings`] was rejected.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SettingsError {
    /// Tile size is not finite and positive.
    InvalidTileSize(f32),
    /// No agent to build a layer for.
    NoAgents,
    /// Agent radius is not finite and non-negative.
    InvalidAgentRadius(f32),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileSize(v) => {
                write!(f, "tile size must be finite and positive, got {v}")
            }
            Self::NoAgents => f.write_str("at least one agent is required"),
            Self::InvalidAgentRadius(v) => {
                write!(f, "agent radius must be finite and non-negative, got {v}")
            }
        }
    }
}

impl core::error::Error for SettingsError {}

impl BuildSettings {
    /// Check the settings a build depends on.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(SettingsError::InvalidTileSize(self.tile_size));
        }
        if self.agents.is_empty() {
            return Err(SettingsError::NoAgents);
        }
        for agent in &self.agents {
            let radius = agent.radius;
            if !(radius.is_finite() && radius >= 0.0) {
                return Err(SettingsError::InvalidAgentRadius(radius));
            }
        }
        Ok(())
    }

    /// Stable 64-bit hash of every setting that affects generated tiles.
    pub fn settings_hash(&self) -> u64 {
        let mut h = blake3::Hasher::new();
        let f = |h: &mut blake3::Hasher, v: f32| {
            h.update(&v.to_bits().to_le_bytes());
        };
        f(&mut h, self.tile_size);
        f(&mut h, self.cell_size);
        f(&mut h, self.cell_height);
        h.update(&(self.agents.len() as u64).to_le_bytes());
        for agent in &self.agents {
            f(&mut h, agent.height);
            f(&mut h, agent.radius);
            f(&mut h, agent.max_climb);
            f(&mut h, agent.max_slope_degrees);
        }
        h.update(&self.included_groups.bits().to_le_bytes());
        match self.bounds {
            None => {
                h.update(&[0]);
            }
            Some(b) => {
                h.update(&[1]);
                for c in b.min.to_array().into_iter().chain(b.max.to_array()) {
                    h.update(&c.to_bits().to_le_bytes());
                }
            }
        }
        let mut head = [0_u8; 8];
        head.copy_from_slice(&h.finalize().as_bytes()[..8]);
        u64::from_le_bytes(head)
    }
}
