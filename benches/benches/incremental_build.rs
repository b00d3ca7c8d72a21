// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use glam::{Mat4, Vec3};
use understory_navmesh::{
    Aabb3D, AgentSettings, BuildCache, BuildRequest, BuildSettings, CancellationToken,
    ColliderShape, Entity, FingerprintTable, NavMeshBuilder, NoPersistence, PrimitiveExtractor,
    StaticCollider, TileCoord, TileData, TileGenError, TileGenerator, diff,
};

/// Stores the vertices that fall inside the tile, standing in for voxelization.
struct VertexFilter;

impl TileGenerator for VertexFilter {
    fn generate(
        &self,
        _agent: &AgentSettings,
        vertices: &[Vec3],
        _indices: &[u32],
        tile_bounds: &Aabb3D,
        _coord: TileCoord,
    ) -> Result<TileData, TileGenError> {
        Ok(TileData {
            data: Vec::new(),
            vertices: vertices
                .iter()
                .copied()
                .filter(|&v| tile_bounds.contains_point(v))
                .collect(),
        })
    }
}

/// An `n` x `n` field of boxes spaced `spacing` apart.
fn gen_scene(n: usize, spacing: f32) -> Vec<Entity> {
    let mut out = Vec::with_capacity(n * n);
    for z in 0..n {
        for x in 0..n {
            let p = Vec3::new(x as f32 * spacing, 1.0, z as f32 * spacing);
            out.push(Entity::new(
                (z * n + x) as u128,
                Mat4::from_translation(p),
                StaticCollider::new(vec![ColliderShape::Box {
                    size: Vec3::new(2.0, 2.0, 2.0),
                    center: Vec3::ZERO,
                }]),
            ));
        }
    }
    out
}

fn settings() -> BuildSettings {
    BuildSettings {
        tile_size: 16.0,
        ..BuildSettings::default()
    }
}

fn build(
    builder: &NavMeshBuilder<PrimitiveExtractor, VertexFilter>,
    cache: &BuildCache<u32>,
    scene: &Vec<Entity>,
) {
    let request = BuildRequest::new(0, scene).with_settings(settings());
    let report = builder
        .build(&request, cache, &mut NoPersistence, &CancellationToken::new())
        .expect("benchmark scene builds");
    black_box(report);
}

fn bench_builds(c: &mut Criterion) {
    let builder = NavMeshBuilder::with_generator(VertexFilter);
    let base = gen_scene(32, 6.0);
    let mut moved = base.clone();
    moved[100].world_transform = Mat4::from_translation(Vec3::new(50.0, 1.0, 3.0));

    let mut group = c.benchmark_group("navmesh_build");
    group.bench_function("full_32x32", |b| {
        b.iter_batched(
            BuildCache::<u32>::default,
            |cache| build(&builder, &cache, &base),
            BatchSize::LargeInput,
        );
    });
    group.bench_function("incremental_one_moved_32x32", |b| {
        b.iter_batched(
            || {
                let cache = BuildCache::<u32>::default();
                build(&builder, &cache, &base);
                cache
            },
            |cache| build(&builder, &cache, &moved),
            BatchSize::LargeInput,
        );
    });
    group.bench_function("noop_32x32", |b| {
        let cache = BuildCache::<u32>::default();
        build(&builder, &cache, &base);
        b.iter(|| build(&builder, &cache, &base));
    });
    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let base = gen_scene(64, 6.0);
    let builder = NavMeshBuilder::with_generator(VertexFilter);
    let cache = BuildCache::<u32>::default();
    build(&builder, &cache, &base);
    let previous = cache
        .get(&0)
        .map(|c| c.fingerprints)
        .unwrap_or_else(FingerprintTable::new);

    c.bench_function("diff_64x64_unchanged", |b| {
        b.iter(|| diff(black_box(&previous), black_box(&base)).is_clean());
    });
}

criterion_group!(benches, bench_builds, bench_diff);
criterion_main!(benches);
