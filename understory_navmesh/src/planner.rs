// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deciding between a full and an incremental rebuild, and which tiles to build.

use std::collections::BTreeSet;
use std::fmt;

use understory_tiling::{Aabb3D, TileCoord, TileGrid};

use crate::cache::CachedBuild;
use crate::diff::SceneDiff;
use crate::fingerprint::FingerprintTable;
use crate::settings::AgentSettings;

/// Why every tile is rebuilt.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FullRebuildReason {
    /// The target has never been built, or its build was evicted.
    NoPreviousBuild,
    /// Build settings, including the agent layers, differ from the previous build.
    SettingsChanged,
    /// An entity with unbounded planes was added, changed or removed.
    UnboundedGeometryChanged,
    /// Scene bounds moved, so every plane quad was resized.
    UnboundedExtentChanged,
}

impl fmt::Display for FullRebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoPreviousBuild => "no previous build",
            Self::SettingsChanged => "settings changed",
            Self::UnboundedGeometryChanged => "unbounded geometry changed",
            Self::UnboundedExtentChanged => "scene extent changed under unbounded geometry",
        })
    }
}

/// Output of [`BuildPlanner::plan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildPlan {
    /// Whether previous tiles are discarded.
    pub full_rebuild: bool,
    /// Set exactly when `full_rebuild` is.
    pub reason: Option<FullRebuildReason>,
    /// Tiles to regenerate, one set per agent layer.
    pub tiles_to_build: Vec<BTreeSet<TileCoord>>,
}

impl BuildPlan {
    /// True for an incremental plan that builds nothing.
    pub fn is_noop(&self) -> bool {
        !self.full_rebuild && self.tiles_to_build.iter().all(BTreeSet::is_empty)
    }

    /// Tiles planned for one layer; empty past the last layer.
    pub fn layer_tiles(&self, layer: usize) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles_to_build.get(layer).into_iter().flatten().copied()
    }

    /// Number of (layer, tile) pairs to generate.
    pub fn tile_count(&self) -> usize {
        self.tiles_to_build.iter().map(BTreeSet::len).sum()
    }
}

/// Plans builds on a fixed tile grid, one layer per agent.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildPlanner {
    grid: TileGrid,
    // Horizontal padding of dirty regions, per layer.
    paddings: Vec<f32>,
}

impl BuildPlanner {
    /// Create a planner; each layer pads dirty regions horizontally by its agent's radius.
    pub fn new(grid: TileGrid, agents: &[AgentSettings]) -> Self {
        Self {
            grid,
            paddings: agents.iter().map(|a| a.radius).collect(),
        }
    }

    /// Number of layers planned.
    pub fn layer_count(&self) -> usize {
        self.paddings.len()
    }

    /// The grid tiles are planned on.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    fn full_rebuild_reason(
        &self,
        diff: &SceneDiff,
        current: &FingerprintTable,
        previous: Option<&CachedBuild>,
        settings_hash: u64,
        scene_bounds: &Aabb3D,
        scene_has_unbounded: bool,
    ) -> Option<FullRebuildReason> {
        let Some(previous) = previous else {
            return Some(FullRebuildReason::NoPreviousBuild);
        };
        if previous.result.settings_hash != settings_hash
            || previous.result.layers.len() != self.layer_count()
        {
            return Some(FullRebuildReason::SettingsChanged);
        }
        if diff.touches_unbounded(current, &previous.fingerprints) {
            return Some(FullRebuildReason::UnboundedGeometryChanged);
        }
        if scene_has_unbounded && previous.result.bounds != *scene_bounds {
            return Some(FullRebuildReason::UnboundedExtentChanged);
        }
        None
    }

    /// Plan a build of `current` against the previous build of the same target.
    ///
    /// A full plan covers every tile of `scene_bounds` in every layer. An incremental plan
    /// covers, per layer, the tiles of every damaged region of `diff` padded by that
    /// layer's agent radius.
    pub fn plan(
        &self,
        diff: &SceneDiff,
        current: &FingerprintTable,
        previous: Option<&CachedBuild>,
        settings_hash: u64,
        scene_bounds: &Aabb3D,
        scene_has_unbounded: bool,
    ) -> BuildPlan {
        let reason = self.full_rebuild_reason(
            diff,
            current,
            previous,
            settings_hash,
            scene_bounds,
            scene_has_unbounded,
        );
        match (reason, previous) {
            (None, Some(previous)) => {
                let damage = diff.damage(current, &previous.fingerprints);
                BuildPlan {
                    full_rebuild: false,
                    reason: None,
                    tiles_to_build: self
                        .paddings
                        .iter()
                        .map(|&pad| damage.tiles(&self.grid, pad))
                        .collect(),
                }
            }
            (reason, _) => {
                let reason = reason.unwrap_or(FullRebuildReason::NoPreviousBuild);
                let tiles: BTreeSet<_> =
                    self.grid.overlapping_tiles(scene_bounds).iter().collect();
                BuildPlan {
                    full_rebuild: true,
                    reason: Some(reason),
                    tiles_to_build: vec![tiles; self.layer_count()],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Mat4, Vec3};

    use super::*;
    use crate::cache::{NavMeshLayer, NavMeshResult};
    use crate::diff::diff;
    use crate::fingerprint::{FingerprintEntry, content_hash};
    use crate::geometry::GeometryBatch;
    use crate::plane::Plane;
    use crate::scene::{ColliderShape, Entity, StaticCollider};

    const HASH: u64 = 42;

    fn entity(id: u128, x: f32, z: f32) -> Entity {
        Entity::new(
            id,
            Mat4::from_translation(Vec3::new(x, 0.0, z)),
            StaticCollider::new(vec![ColliderShape::Box {
                size: Vec3::ONE,
                center: Vec3::ZERO,
            }]),
        )
    }

    fn table(entities: &[Entity], planes: &[Plane]) -> FingerprintTable {
        let mut t = FingerprintTable::new();
        for e in entities {
            let p = e.world_transform.w_axis.truncate();
            t.insert(FingerprintEntry {
                entity_id: e.id,
                content_hash: content_hash(e),
                geometry: Arc::new(GeometryBatch::from_buffers(
                    vec![p - Vec3::splat(0.5), p + Vec3::splat(0.5)],
                    Vec::new(),
                )),
                planes: Arc::from(planes),
            });
        }
        t
    }

    fn agent(radius: f32) -> AgentSettings {
        AgentSettings {
            radius,
            ..AgentSettings::default()
        }
    }

    fn cached_layers(
        entities: &[Entity],
        bounds: Aabb3D,
        agents: &[AgentSettings],
    ) -> CachedBuild {
        CachedBuild {
            fingerprints: table(entities, &[]),
            result: NavMeshResult {
                layers: agents.iter().copied().map(NavMeshLayer::new).collect(),
                settings_hash: HASH,
                bounds,
            },
        }
    }

    fn cached(entities: &[Entity], bounds: Aabb3D) -> CachedBuild {
        cached_layers(entities, bounds, &[agent(0.0)])
    }

    fn planner() -> BuildPlanner {
        BuildPlanner::new(TileGrid::new(10.0), &[agent(0.0)])
    }

    fn scene_bounds() -> Aabb3D {
        Aabb3D::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(40.0, 5.0, 20.0))
    }

    #[test]
    fn first_build_is_full_over_scene_bounds() {
        let scene = [entity(1, 5.0, 5.0)];
        let current = table(&scene, &[]);
        let d = diff(&FingerprintTable::new(), &scene);
        let plan = planner().plan(&d, &current, None, HASH, &scene_bounds(), false);
        assert!(plan.full_rebuild);
        assert_eq!(plan.reason, Some(FullRebuildReason::NoPreviousBuild));
        assert_eq!(plan.tile_count(), 4 * 2);
    }

    #[test]
    fn settings_change_forces_full_rebuild() {
        let scene = [entity(1, 5.0, 5.0)];
        let previous = cached(&scene, scene_bounds());
        let d = diff(&previous.fingerprints, &scene);
        let plan = planner().plan(
            &d,
            &previous.fingerprints,
            Some(&previous),
            HASH + 1,
            &scene_bounds(),
            false,
        );
        assert_eq!(plan.reason, Some(FullRebuildReason::SettingsChanged));
    }

    #[test]
    fn unchanged_scene_plans_nothing() {
        let scene = [entity(1, 5.0, 5.0), entity(2, 25.0, 5.0)];
        let previous = cached(&scene, scene_bounds());
        let d = diff(&previous.fingerprints, &scene);
        let plan = planner().plan(
            &d,
            &previous.fingerprints,
            Some(&previous),
            HASH,
            &scene_bounds(),
            false,
        );
        assert!(plan.is_noop());
    }

    #[test]
    fn moved_entity_rebuilds_old_and_new_tiles() {
        let before = [entity(1, 5.0, 5.0), entity(2, 25.0, 15.0)];
        let after = [entity(1, 35.0, 5.0), entity(2, 25.0, 15.0)];
        let previous = cached(&before, scene_bounds());
        let current = table(&after, &[]);
        let d = diff(&previous.fingerprints, &after);
        let plan = planner().plan(&d, &current, Some(&previous), HASH, &scene_bounds(), false);
        assert!(!plan.full_rebuild);
        assert_eq!(
            plan.layer_tiles(0).collect::<Vec<_>>(),
            [TileCoord::new(0, 0), TileCoord::new(3, 0)]
        );
    }

    #[test]
    fn removed_entity_rebuilds_its_tiles() {
        let before = [entity(1, 5.0, 5.0), entity(2, 25.0, 15.0)];
        let after = [entity(1, 5.0, 5.0)];
        let previous = cached(&before, scene_bounds());
        let current = table(&after, &[]);
        let d = diff(&previous.fingerprints, &after);
        let plan = planner().plan(&d, &current, Some(&previous), HASH, &scene_bounds(), false);
        assert_eq!(
            plan.layer_tiles(0).collect::<Vec<_>>(),
            [TileCoord::new(2, 1)]
        );
    }

    #[test]
    fn agent_radius_pads_dirty_regions() {
        let before = [entity(1, 5.0, 5.0)];
        let after = [entity(1, 5.0, 4.0)];
        let previous = cached(&before, scene_bounds());
        let current = table(&after, &[]);
        let d = diff(&previous.fingerprints, &after);
        let padded = BuildPlanner::new(TileGrid::new(10.0), &[agent(5.0)]);
        let plan = padded.plan(&d, &current, Some(&previous), HASH, &scene_bounds(), false);
        assert_eq!(plan.tile_count(), 9);
    }

    #[test]
    fn each_layer_pads_by_its_own_agent() {
        let agents = [agent(0.0), agent(5.0)];
        let before = [entity(1, 5.0, 5.0)];
        let after = [entity(1, 5.0, 4.0)];
        let previous = cached_layers(&before, scene_bounds(), &agents);
        let current = table(&after, &[]);
        let d = diff(&previous.fingerprints, &after);
        let layered = BuildPlanner::new(TileGrid::new(10.0), &agents);
        let plan = layered.plan(&d, &current, Some(&previous), HASH, &scene_bounds(), false);
        assert!(!plan.full_rebuild);
        assert_eq!(plan.tiles_to_build.len(), 2);
        assert_eq!(plan.layer_tiles(0).collect::<Vec<_>>(), [TileCoord::new(0, 0)]);
        assert_eq!(plan.layer_tiles(1).count(), 9);
        assert_eq!(plan.layer_tiles(2).count(), 0);

        let d = diff(&FingerprintTable::new(), &after);
        let plan = layered.plan(&d, &current, None, HASH, &scene_bounds(), false);
        assert_eq!(plan.tiles_to_build, vec![plan.tiles_to_build[0].clone(); 2]);
        assert_eq!(plan.tile_count(), 2 * 8);
    }

    #[test]
    fn layer_count_change_forces_full_rebuild() {
        let scene = [entity(1, 5.0, 5.0)];
        let previous = cached(&scene, scene_bounds());
        let d = diff(&previous.fingerprints, &scene);
        let layered = BuildPlanner::new(TileGrid::new(10.0), &[agent(0.0), agent(1.0)]);
        let plan = layered.plan(
            &d,
            &previous.fingerprints,
            Some(&previous),
            HASH,
            &scene_bounds(),
            false,
        );
        assert_eq!(plan.reason, Some(FullRebuildReason::SettingsChanged));
    }

    #[test]
    fn unbounded_changes_force_full_rebuild() {
        let plane = Plane::new(Vec3::Y, 0.0).unwrap();
        let before = [entity(1, 5.0, 5.0)];
        let after = [entity(1, 5.0, 5.0), entity(9, 0.0, 0.0)];
        let previous = cached(&before, scene_bounds());
        let mut current = table(&before, &[]);
        for entry in table(&after[1..], &[plane]).iter() {
            current.insert(entry.clone());
        }
        let d = diff(&previous.fingerprints, &after);
        let plan = planner().plan(&d, &current, Some(&previous), HASH, &scene_bounds(), true);
        assert_eq!(plan.reason, Some(FullRebuildReason::UnboundedGeometryChanged));
        assert_eq!(plan.tile_count(), 8);
    }

    #[test]
    fn bounds_change_under_planes_forces_full_rebuild() {
        let scene = [entity(1, 5.0, 5.0)];
        let previous = cached(&scene, scene_bounds());
        let d = diff(&previous.fingerprints, &scene);
        let grown = scene_bounds().union(Aabb3D::from_point(Vec3::new(60.0, 0.0, 0.0)));
        let plan = planner().plan(&d, &previous.fingerprints, Some(&previous), HASH, &grown, true);
        assert_eq!(plan.reason, Some(FullRebuildReason::UnboundedExtentChanged));

        let plan = planner().plan(&d, &previous.fingerprints, Some(&previous), HASH, &grown, false);
        assert!(plan.is_noop());
    }
}
