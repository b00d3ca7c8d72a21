// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_navmesh --heading-base-level=0

//! Understory Navmesh: incremental, tile-based navigation mesh builds with a build cache.
//!
//! Building a navigation mesh is expensive. This crate keeps the cost of a rebuild
//! proportional to what changed in the scene rather than to the size of the scene.
//!
//! - Every blocking entity gets a content fingerprint of its transform, shapes and
//!   collision group. Unchanged entities reuse their previously extracted geometry.
//! - New, changed and removed entities become dirty regions, mapped onto a regular tile
//!   grid by [`understory_tiling`]. Only those tiles are regenerated.
//! - Settings changes and edits to unbounded planes rebuild everything.
//! - Results are kept per build target in an LRU [`BuildCache`].
//!
//! Triangulating a tile into walkable polygons is left to a [`TileGenerator`], and
//! persisting results to a [`Persistence`]. The [`PrimitiveExtractor`] turns boxes,
//! spheres, capsules, cylinders, cones and convex hulls into triangles.
//!
//! Each agent in [`BuildSettings::agents`] gets its own [`NavMeshLayer`]. Dirty regions are
//! padded by that agent's radius before they are mapped to tiles.
//!
//! ## Build stages
//!
//! [`NavMeshBuilder::build`] runs through the [`BuildStage`]s in order. Cancellation through
//! a [`CancellationToken`] is observed between stages and between tiles; a cancelled or
//! failed build never touches the cache.
//!
//! Unbounded planes are resolved in a second pass once the bounds of the bounded geometry
//! are known: each becomes a quad centred on the scene and as wide as its largest extent.
//!
//! ## Minimal usage
//!
//! ```
//! use glam::{Mat4, Vec3};
//! use understory_navmesh::{
//!     Aabb3D, AgentSettings, BuildCache, BuildRequest, BuildSettings, CancellationToken,
//!     ColliderShape, Entity, NavMeshBuilder, NoPersistence, StaticCollider, TileCoord,
//!     TileData, TileGenError, TileGenerator,
//! };
//!
//! /// Stores the tile bounds instead of real navigation data.
//! struct Outline;
//!
//! impl TileGenerator for Outline {
//!     fn generate(
//!         &self,
//!         _agent: &AgentSettings,
//!         _vertices: &[Vec3],
//!         _indices: &[u32],
//!         tile_bounds: &Aabb3D,
//!         _coord: TileCoord,
//!     ) -> Result<TileData, TileGenError> {
//!         Ok(TileData { data: Vec::new(), vertices: vec![tile_bounds.min, tile_bounds.max] })
//!     }
//! }
//!
//! let crate_box = |id: u128, x: f32| {
//!     let shape = ColliderShape::Box { size: Vec3::splat(2.0), center: Vec3::ZERO };
//!     let at = Mat4::from_translation(Vec3::new(x, 1.0, 4.0));
//!     Entity::new(id, at, StaticCollider::new(vec![shape]))
//! };
//!
//! let builder = NavMeshBuilder::with_generator(Outline);
//! let settings = BuildSettings { tile_size: 8.0, ..BuildSettings::default() };
//! let cache = BuildCache::for_settings(&settings);
//!
//! let mut scene = vec![crate_box(1, 4.0), crate_box(2, 28.0)];
//! let request = BuildRequest::new("level-1", &scene).with_settings(settings.clone());
//! let first = builder.build(&request, &cache, &mut NoPersistence, &CancellationToken::new())?;
//! assert!(first.plan.full_rebuild);
//!
//! // Nudge the second box: only the tiles around it are rebuilt.
//! scene[1] = crate_box(2, 29.0);
//! let request = BuildRequest::new("level-1", &scene).with_settings(settings);
//! let second = builder.build(&request, &cache, &mut NoPersistence, &CancellationToken::new())?;
//! assert!(!second.plan.full_rebuild);
//! assert_eq!(second.unchanged_entities, 1);
//! assert!(second.built_tiles.len() < first.built_tiles.len());
//! # Ok::<(), understory_navmesh::BuildError>(())
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): generate the tiles of a build on the rayon global pool.
//! - `serde`: serialize settings, collider shapes and tile coordinates.

pub mod build;
pub mod cache;
mod collect;
pub mod diff;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod generator;
pub mod geometry;
pub mod plane;
pub mod planner;
pub mod scene;
pub mod settings;
pub mod types;

pub use build::{BuildReport, BuildRequest, BuildStage, CancellationToken, NavMeshBuilder};
pub use cache::{
    BuildCache, BuildCacheStore, CachedBuild, NavMeshLayer, NavMeshResult, TileData,
};
pub use diff::{EntityDelta, EntityState, RemovedEntity, SceneDiff, diff};
pub use error::{BuildError, TileGenError};
pub use extract::{GeometryExtractor, PrimitiveExtractor};
pub use fingerprint::{FingerprintEntry, FingerprintTable, content_hash};
pub use generator::{NoPersistence, Persistence, TileGenerator};
pub use geometry::{GeometryAccumulator, GeometryBatch, MeshData};
pub use plane::Plane;
pub use planner::{BuildPlan, BuildPlanner, FullRebuildReason};
pub use scene::{ColliderShape, Entity, Scene, StaticCollider};
pub use settings::{AgentSettings, BuildSettings, SettingsError};
pub use types::{CollisionGroups, EntityId};
pub use understory_tiling::{Aabb3D, Damage, TileCoord, TileGrid, TileRange};
