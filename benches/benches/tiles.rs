// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use understory_tiling::{Aabb3D, Damage, TileGrid};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

/// Boxes of edge up to `max_size`, scattered over a `world` x `world` square.
fn gen_boxes(count: usize, world: f32, max_size: f32, seed: u64) -> Vec<Aabb3D> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let min = Vec3::new(
                rng.next_f32() * world - world * 0.5,
                rng.next_f32() * 10.0,
                rng.next_f32() * world - world * 0.5,
            );
            let size = Vec3::new(
                rng.next_f32() * max_size,
                rng.next_f32() * 4.0,
                rng.next_f32() * max_size,
            );
            Aabb3D::new(min, min + size)
        })
        .collect()
}

fn bench_overlapping(c: &mut Criterion) {
    let grid = TileGrid::new(32.0);
    let mut group = c.benchmark_group("overlapping_tiles");
    for &(label, max_size) in &[("small", 8.0_f32), ("large", 96.0)] {
        let boxes = gen_boxes(10_000, 4096.0, max_size, 0xCAFE_F00D_DEAD_BEEF);
        group.throughput(Throughput::Elements(boxes.len() as u64));
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut n = 0;
                for bx in &boxes {
                    n += grid.overlapping_tiles(black_box(bx)).len();
                }
                black_box(n)
            });
        });
    }
    group.finish();
}

fn bench_clamp(c: &mut Criterion) {
    let grid = TileGrid::new(32.0);
    let scene = Aabb3D::new(Vec3::new(-2048.0, -5.0, -2048.0), Vec3::new(2048.0, 40.0, 2048.0));
    let tiles: Vec<_> = grid.overlapping_tiles(&scene).iter().collect();
    let mut group = c.benchmark_group("clamp_to_tile");
    group.throughput(Throughput::Elements(tiles.len() as u64));
    group.bench_function("scene_128x128", |b| {
        b.iter(|| {
            tiles
                .iter()
                .filter_map(|&t| grid.clamp_to_tile(black_box(&scene), t))
                .count()
        });
    });
    group.finish();
}

fn bench_damage_tiles(c: &mut Criterion) {
    let grid = TileGrid::new(32.0);
    let mut group = c.benchmark_group("damage_tiles");
    for &count in &[16_usize, 256, 4096] {
        let old = gen_boxes(count, 4096.0, 12.0, 0xBADC_F00D_1234_5678);
        let new = gen_boxes(count, 4096.0, 12.0, 0xC1A5_7E55_9999_ABCD);
        let damage = Damage {
            moved: old.into_iter().zip(new).collect(),
            ..Damage::default()
        };
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("moved_{count}"), |b| {
            b.iter(|| black_box(&damage).tiles(&grid, 0.5).len());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_overlapping, bench_clamp, bench_damage_tiles);
criterion_main!(benches);
