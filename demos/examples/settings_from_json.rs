// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Load build settings and a scene from JSON.
//!
//! Settings fields that are left out fall back to their defaults. Changing any setting
//! that feeds the settings hash forces a full rebuild of a cached target. Each listed
//! agent gets its own navmesh layer.
//!
//! Run:
//! - `cargo run -p understory_demos --example settings_from_json`

use std::error::Error;

use glam::Vec3;
use understory_navmesh::{
    Aabb3D, AgentSettings, BuildCache, BuildRequest, BuildSettings, CancellationToken, Entity,
    NavMeshBuilder, NoPersistence, TileCoord, TileData, TileGenError,
};
use understory_tiling::TileGrid;

const SETTINGS: &str = r#"{
    "tile_size": 10.0,
    "agents": [ { "radius": 0.25 }, { "radius": 1.0, "height": 2.5 } ],
    "included_groups": "DEFAULT | STATIC"
}"#;

const SCENE: &str = r#"[
    {
        "id": 1,
        "world_transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 2,0,3,1],
        "collider": {
            "enabled": true,
            "is_trigger": false,
            "group": "STATIC",
            "shapes": [ { "Box": { "size": [4,1,4], "center": [0,0.5,0] } } ]
        }
    },
    {
        "id": 2,
        "world_transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 18,0,14,1],
        "collider": {
            "enabled": true,
            "is_trigger": false,
            "group": "DEFAULT",
            "shapes": [
                { "Compound": [
                    { "Capsule": { "length": 2, "radius": 0.5, "center": [0,1.5,0] } },
                    { "Sphere": { "radius": 1, "center": [0,0,0] } }
                ] }
            ]
        }
    },
    {
        "id": 3,
        "world_transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 30,0,0,1],
        "collider": {
            "enabled": true,
            "is_trigger": false,
            "group": "CUSTOM1",
            "shapes": [ { "Box": { "size": [1,1,1], "center": [0,0,0] } } ]
        }
    }
]"#;

fn flat_tile(
    _agent: &AgentSettings,
    vertices: &[Vec3],
    _indices: &[u32],
    tile_bounds: &Aabb3D,
    _coord: TileCoord,
) -> Result<TileData, TileGenError> {
    let inside: Vec<Vec3> = vertices
        .iter()
        .copied()
        .filter(|&v| tile_bounds.contains_point(v))
        .collect();
    Ok(TileData {
        data: Vec::new(),
        vertices: inside,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let settings: BuildSettings = serde_json::from_str(SETTINGS)?;
    let scene: Vec<Entity> = serde_json::from_str(SCENE)?;
    println!("settings: {settings:?}");
    println!("settings hash: {:016x}", settings.settings_hash());

    let builder = NavMeshBuilder::with_generator(flat_tile);
    let cache = BuildCache::for_settings(&settings);
    let request = BuildRequest::new("json-level", &scene).with_settings(settings.clone());
    let report = builder.build(&request, &cache, &mut NoPersistence, &CancellationToken::new())?;

    // Entity 3 sits in a group the build does not include.
    println!("blocking entities: {}", report.new_entities);
    let grid = TileGrid::new(settings.tile_size);
    for (layer, tiles) in report.result.layers.iter().enumerate() {
        println!("layer {layer} (agent radius {}):", tiles.agent.radius);
        for (coord, tile) in &tiles.tiles {
            let rect = grid.tile_rect(*coord);
            println!(
                "  tile {coord}: x {:.0}..{:.0}, z {:.0}..{:.0}, {} vertices",
                rect.x0,
                rect.x1,
                rect.y0,
                rect.y1,
                tile.vertices.len()
            );
        }
    }

    // Settings round-trip through JSON; a coarser cell size invalidates the cache entry.
    let mut coarser: BuildSettings = serde_json::from_str(&serde_json::to_string(&settings)?)?;
    coarser.cell_size *= 2.0;
    let request = BuildRequest::new("json-level", &scene).with_settings(coarser);
    let report = builder.build(&request, &cache, &mut NoPersistence, &CancellationToken::new())?;
    println!(
        "after changing cell size: full rebuild = {}, reason = {:?}",
        report.plan.full_rebuild, report.plan.reason
    );

    Ok(())
}
