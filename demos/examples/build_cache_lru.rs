// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build cache eviction.
//!
//! Build more levels than the cache holds and watch the least recently built one
//! fall out; rebuilding it starts from scratch again.
//!
//! Run:
//! - `RUST_LOG=info cargo run -p understory_demos --example build_cache_lru`

use glam::{Mat4, Vec3};
use understory_navmesh::{
    Aabb3D, AgentSettings, BuildCache, BuildRequest, BuildSettings, CancellationToken,
    ColliderShape, Entity, NavMeshBuilder, NavMeshResult, Persistence, StaticCollider, TileCoord,
    TileData, TileGenError,
};

/// Records the size of every saved result.
#[derive(Default)]
struct SaveLog(Vec<(String, usize)>);

impl Persistence<String> for SaveLog {
    fn save(&mut self, target: &String, result: &NavMeshResult) {
        self.0.push((target.clone(), result.tile_count()));
    }
}

fn outline(
    _agent: &AgentSettings,
    _vertices: &[Vec3],
    _indices: &[u32],
    tile_bounds: &Aabb3D,
    _coord: TileCoord,
) -> Result<TileData, TileGenError> {
    Ok(TileData {
        data: Vec::new(),
        vertices: vec![tile_bounds.min, tile_bounds.max],
    })
}

fn level(seed: u32) -> Vec<Entity> {
    (0..4_u32)
        .map(|i| {
            let p = Vec3::new((seed * 7 + i * 13) as f32, 0.0, (i * 11) as f32);
            Entity::new(
                u128::from(i),
                Mat4::from_translation(p),
                StaticCollider::new(vec![ColliderShape::Sphere {
                    radius: 1.5,
                    center: Vec3::Y,
                }]),
            )
        })
        .collect()
}

fn main() {
    env_logger::init();

    let settings = BuildSettings {
        tile_size: 8.0,
        cache_capacity: 3,
        ..BuildSettings::default()
    };
    let builder = NavMeshBuilder::with_generator(outline);
    let cache = BuildCache::for_settings(&settings);
    let mut saves = SaveLog::default();
    let cancel = CancellationToken::new();

    let levels: Vec<(String, Vec<Entity>)> =
        (0..5).map(|i| (format!("level-{i}"), level(i))).collect();

    for (name, scene) in levels.iter().chain(levels.iter().take(1)) {
        let request = BuildRequest::new(name.clone(), scene).with_settings(settings.clone());
        match builder.build(&request, &cache, &mut saves, &cancel) {
            Ok(report) => {
                let kind = report
                    .plan
                    .reason
                    .map_or_else(|| "incremental".to_string(), |r| r.to_string());
                println!("{name}: {kind}, {} tiles", report.result.tile_count());
            }
            Err(e) => log::error!("{name}: build failed: {e}"),
        }
        log::info!("cached targets, oldest first: {:?}", cache.keys());
    }

    println!("saved {} results", saves.0.len());
    for (name, tiles) in &saves.0 {
        println!("  {name}: {tiles} tiles");
    }
}
