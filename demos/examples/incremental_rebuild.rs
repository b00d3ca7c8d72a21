// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental rebuild walkthrough.
//!
//! Build a small level, move one crate, remove another, then drop in a ground plane,
//! and print which tiles each build touched.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example incremental_rebuild`

use glam::{Mat4, Vec3};
use understory_navmesh::{
    Aabb3D, AgentSettings, BuildCache, BuildError, BuildReport, BuildRequest, BuildSettings,
    CancellationToken, ColliderShape, Entity, NavMeshBuilder, NoPersistence, StaticCollider,
    TileCoord, TileData, TileGenError, TileGenerator,
};

/// Keeps triangles the agent can stand on whose centroid lies in the tile.
struct WalkableTriangles;

impl TileGenerator for WalkableTriangles {
    fn generate(
        &self,
        agent: &AgentSettings,
        vertices: &[Vec3],
        indices: &[u32],
        tile_bounds: &Aabb3D,
        _coord: TileCoord,
    ) -> Result<TileData, TileGenError> {
        let min_normal_y = agent.max_slope_degrees.to_radians().cos();
        let mut out = Vec::new();
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize]);
            let normal = (b - a).cross(c - a).normalize_or_zero();
            let centroid = (a + b + c) / 3.0;
            if normal.y >= min_normal_y && tile_bounds.contains_point(centroid) {
                out.extend([a, b, c]);
            }
        }
        let count = u32::try_from(out.len() / 3)
            .map_err(|_| TileGenError::new("too many triangles in one tile"))?;
        Ok(TileData {
            data: count.to_le_bytes().to_vec(),
            vertices: out,
        })
    }
}

fn crate_at(id: u128, x: f32, z: f32) -> Entity {
    let shape = ColliderShape::Box {
        size: Vec3::new(4.0, 2.0, 4.0),
        center: Vec3::new(0.0, 1.0, 0.0),
    };
    Entity::new(
        id,
        Mat4::from_translation(Vec3::new(x, 0.0, z)),
        StaticCollider::new(vec![shape]),
    )
}

fn print_report(label: &str, report: &BuildReport) {
    let kind = match report.plan.reason {
        Some(reason) => format!("full ({reason})"),
        None => "incremental".to_string(),
    };
    println!("{label}: {kind}");
    println!(
        "  entities: {} new, {} changed, {} unchanged, {} removed",
        report.new_entities,
        report.changed_entities,
        report.unchanged_entities,
        report.removed_entities
    );
    println!("  built:   {:?}", report.built_tiles);
    println!("  removed: {:?}", report.removed_tiles);
    println!("  total tiles: {}", report.result.tile_count());
}

fn main() -> Result<(), BuildError> {
    env_logger::init();

    let settings = BuildSettings {
        tile_size: 16.0,
        ..BuildSettings::default()
    };
    let builder = NavMeshBuilder::with_generator(WalkableTriangles);
    let cache = BuildCache::for_settings(&settings);
    let cancel = CancellationToken::new();

    let mut level = vec![
        crate_at(1, 4.0, 4.0),
        crate_at(2, 40.0, 8.0),
        crate_at(3, 20.0, 40.0),
    ];
    let build = |label: &str, scene: &Vec<Entity>| -> Result<(), BuildError> {
        let request = BuildRequest::new("level", scene).with_settings(settings.clone());
        let report = builder.build(&request, &cache, &mut NoPersistence, &cancel)?;
        print_report(label, &report);
        Ok(())
    };

    build("initial build", &level)?;
    build("unchanged", &level)?;

    level[1] = crate_at(2, 44.0, 8.0);
    build("crate 2 nudged", &level)?;

    level.remove(2);
    build("crate 3 removed", &level)?;

    level.push(Entity::new(
        9,
        Mat4::IDENTITY,
        StaticCollider::new(vec![ColliderShape::Plane {
            normal: Vec3::Y,
            distance: 0.0,
        }]),
    ));
    build("ground plane added", &level)?;

    Ok(())
}
