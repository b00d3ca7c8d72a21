// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build orchestration: from a scene to a committed, cached navigation mesh.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use understory_tiling::{Aabb3D, TileCoord, TileGrid};

use crate::cache::{BuildCache, CachedBuild, NavMeshLayer, NavMeshResult, TileData};
use crate::collect::SceneGeometry;
use crate::diff::{EntityState, diff};
use crate::error::BuildError;
use crate::extract::{GeometryExtractor, PrimitiveExtractor};
use crate::fingerprint::FingerprintTable;
use crate::generator::{Persistence, TileGenerator};
use crate::geometry::GeometryAccumulator;
use crate::planner::{BuildPlan, BuildPlanner};
use crate::scene::Scene;
use crate::settings::{AgentSettings, BuildSettings};

/// Stages of a build, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuildStage {
    /// Settings validation.
    Start,
    /// Listing the blocking entities of the scene.
    CollectEntities,
    /// Diffing against the cached fingerprints and extracting changed geometry.
    Fingerprint,
    /// Computing the scene bounds.
    SceneBounds,
    /// Turning unbounded planes into quads.
    ResolveUnbounded,
    /// Choosing the tiles to build.
    Plan,
    /// Running the tile generator.
    GenerateTiles,
    /// Saving and caching the result.
    Commit,
    /// Finished.
    Done,
}

/// Cooperative cancellation flag shared between a build and its owner.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Builds observe it at their next stage or tile.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn enter(&self, stage: BuildStage) -> Result<(), BuildError> {
        log::debug!("build stage {stage:?}");
        if self.is_cancelled() {
            return Err(BuildError::Cancelled { stage });
        }
        Ok(())
    }
}

/// What to build.
pub struct BuildRequest<'a, K> {
    /// Cache key of the build target.
    pub target: K,
    /// The scene; `None` fails with [`BuildError::NoTargetScene`].
    pub scene: Option<&'a dyn Scene>,
    /// Settings of the build.
    pub settings: BuildSettings,
}

impl<K: fmt::Debug> fmt::Debug for BuildRequest<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildRequest")
            .field("target", &self.target)
            .field("has_scene", &self.scene.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl<'a, K> BuildRequest<'a, K> {
    /// A request with default settings.
    pub fn new(target: K, scene: &'a dyn Scene) -> Self {
        Self {
            target,
            scene: Some(scene),
            settings: BuildSettings::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Summary of a committed build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildReport {
    /// The plan that was executed.
    pub plan: BuildPlan,
    /// Entities not in the previous build.
    pub new_entities: usize,
    /// Entities whose content hash changed.
    pub changed_entities: usize,
    /// Entities reused from the previous build.
    pub unchanged_entities: usize,
    /// Entities of the previous build that no longer block.
    pub removed_entities: usize,
    /// Scene bounds the tiles were built against.
    pub scene_bounds: Aabb3D,
    /// Tiles generated and stored, as (layer, tile) pairs.
    pub built_tiles: Vec<(usize, TileCoord)>,
    /// Tiles dropped from the result, as (layer, tile) pairs.
    pub removed_tiles: Vec<(usize, TileCoord)>,
    /// The committed result.
    pub result: NavMeshResult,
}

/// One tile of one layer waiting for the generator.
#[derive(Copy, Clone, Debug)]
struct TileJob<'a> {
    layer: usize,
    agent: &'a AgentSettings,
    coord: TileCoord,
    tile_bounds: Aabb3D,
}

/// Incremental navigation mesh builder.
///
/// Each build diffs the scene against the target's cached fingerprints and regenerates
/// only the tiles touched by what changed, in every agent layer. Everything else is
/// carried over from the cache, sharing tile data and geometry with the previous build.
///
/// The cache is created by the caller, typically with [`BuildCache::for_settings`].
#[derive(Clone, Debug)]
pub struct NavMeshBuilder<E, G> {
    extractor: E,
    generator: G,
}

impl<G: TileGenerator> NavMeshBuilder<PrimitiveExtractor, G> {
    /// A builder using the [`PrimitiveExtractor`].
    pub fn with_generator(generator: G) -> Self {
        Self::new(PrimitiveExtractor::default(), generator)
    }
}

impl<E: GeometryExtractor, G: TileGenerator> NavMeshBuilder<E, G> {
    /// Create a builder from its collaborators.
    pub fn new(extractor: E, generator: G) -> Self {
        Self {
            extractor,
            generator,
        }
    }

    /// The tile generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Build `request.target`, committing to `persistence` and then `cache`.
    ///
    /// Nothing is committed unless every stage succeeds.
    pub fn build<K: Clone + Eq + Hash>(
        &self,
        request: &BuildRequest<'_, K>,
        cache: &BuildCache<K>,
        persistence: &mut dyn Persistence<K>,
        cancel: &CancellationToken,
    ) -> Result<BuildReport, BuildError> {
        let settings = &request.settings;
        cancel.enter(BuildStage::Start)?;
        settings.validate()?;
        let grid = TileGrid::new(settings.tile_size);
        let settings_hash = settings.settings_hash();

        cancel.enter(BuildStage::CollectEntities)?;
        let scene = request.scene.ok_or(BuildError::NoTargetScene)?;
        let entities = scene.list_blocking_entities(settings.included_groups);

        cancel.enter(BuildStage::Fingerprint)?;
        let previous = cache.get(&request.target);
        let empty = FingerprintTable::new();
        let previous_fingerprints = previous.as_ref().map_or(&empty, |p| &p.fingerprints);
        let scene_diff = diff(previous_fingerprints, &entities);
        let mut geometry =
            SceneGeometry::collect(&scene_diff, &entities, previous_fingerprints, &self.extractor);

        cancel.enter(BuildStage::SceneBounds)?;
        let mut bounds = settings.bounds.unwrap_or_else(|| geometry.bounded_bounds());
        if bounds.is_empty() {
            bounds = geometry
                .anchor_bounds(settings.tile_size)
                .ok_or(BuildError::EmptyBounds)?;
        }

        cancel.enter(BuildStage::ResolveUnbounded)?;
        let has_unbounded = geometry.has_unbounded();
        let scene_bounds = geometry.resolve_unbounded(bounds, settings.bounds.is_none());

        cancel.enter(BuildStage::Plan)?;
        let planner = BuildPlanner::new(grid, &settings.agents);
        let plan = planner.plan(
            &scene_diff,
            &geometry.fingerprints,
            previous.as_ref(),
            settings_hash,
            &scene_bounds,
            has_unbounded,
        );

        cancel.enter(BuildStage::GenerateTiles)?;
        let mut removed_tiles = Vec::new();
        let mut jobs = Vec::with_capacity(plan.tile_count());
        let layer_tiles = settings.agents.iter().zip(&plan.tiles_to_build);
        for (layer, (agent, tiles)) in layer_tiles.enumerate() {
            for &coord in tiles {
                match grid.clamp_to_tile(&scene_bounds, coord) {
                    Some(tile_bounds) => jobs.push(TileJob {
                        layer,
                        agent,
                        coord,
                        tile_bounds,
                    }),
                    None => removed_tiles.push((layer, coord)),
                }
            }
        }
        let generated = self.generate_tiles(&jobs, &geometry.scene, cancel)?;

        cancel.enter(BuildStage::Commit)?;
        let mut layers = match &previous {
            Some(previous) if !plan.full_rebuild => previous.result.layers.clone(),
            _ => settings.agents.iter().copied().map(NavMeshLayer::new).collect(),
        };
        let mut built_tiles = Vec::with_capacity(generated.len());
        for ((layer, coord), tile) in generated {
            if tile.is_empty() {
                removed_tiles.push((layer, coord));
            } else if let Some(target) = layers.get_mut(layer) {
                target.tiles.insert(coord, Arc::new(tile));
                built_tiles.push((layer, coord));
            }
        }
        removed_tiles.sort_unstable();
        for &(layer, coord) in &removed_tiles {
            if let Some(target) = layers.get_mut(layer)
                && target.tiles.remove(&coord).is_some()
            {
                log::debug!("removed tile {coord} of layer {layer}");
            }
        }

        let result = NavMeshResult {
            layers,
            settings_hash,
            bounds: scene_bounds,
        };
        persistence.save(&request.target, &result);
        cache.put(
            request.target.clone(),
            CachedBuild {
                fingerprints: geometry.fingerprints,
                result: result.clone(),
            },
        );

        match plan.reason {
            Some(reason) => log::info!(
                "full navmesh build ({reason}): {} tiles built over {} layers, {} total",
                built_tiles.len(),
                result.layers.len(),
                result.tile_count()
            ),
            None => log::info!(
                "incremental navmesh build: {} tiles built, {} removed, {} total",
                built_tiles.len(),
                removed_tiles.len(),
                result.tile_count()
            ),
        }
        log::debug!("build stage {:?}", BuildStage::Done);

        Ok(BuildReport {
            new_entities: scene_diff.count(EntityState::New),
            changed_entities: scene_diff.count(EntityState::Changed),
            unchanged_entities: scene_diff.count(EntityState::Unchanged),
            removed_entities: scene_diff.removed.len(),
            plan,
            scene_bounds,
            built_tiles,
            removed_tiles,
            result,
        })
    }

    fn generate_tiles(
        &self,
        jobs: &[TileJob<'_>],
        scene: &GeometryAccumulator,
        cancel: &CancellationToken,
    ) -> Result<Vec<((usize, TileCoord), TileData)>, BuildError> {
        let generator = &self.generator;
        let run = |job: &TileJob<'_>| {
            if cancel.is_cancelled() {
                return Err(BuildError::Cancelled {
                    stage: BuildStage::GenerateTiles,
                });
            }
            let TileJob {
                layer,
                agent,
                coord,
                tile_bounds,
            } = *job;
            generator
                .generate(agent, scene.vertices(), scene.indices(), &tile_bounds, coord)
                .map(|tile| ((layer, coord), tile))
                .map_err(|source| {
                    log::error!("tile {coord} of layer {layer} failed to generate: {source}");
                    BuildError::TileGenerationFailed {
                        layer,
                        coord,
                        source,
                    }
                })
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(run).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            jobs.iter().map(run).collect()
        }
    }
}
