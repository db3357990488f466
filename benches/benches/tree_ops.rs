// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Vec2};
use thicket_aabb_tree::{DynamicTree, RayCastInput};

fn gen_grid_rects(n: usize, cell: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            out.push(Rect::new(x0, y0, x0 + cell, y0 + cell));
        }
    }
    out
}

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
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_random_rects(count: usize, max_w: f64, max_h: f64, rect_w: f64, rect_h: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (max_w - rect_w).max(1.0);
        let y0 = rng.next_f64() * (max_h - rect_h).max(1.0);
        out.push(Rect::new(x0, y0, x0 + rect_w, y0 + rect_h));
    }
    out
}

fn gen_clustered_rects(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(Rect::new(cx + dx, cy + dy, cx + dx + 12.0, cy + dy + 12.0));
        }
    }
    out
}

fn build_tree(rects: &[Rect]) -> DynamicTree<u32> {
    let mut tree = DynamicTree::new();
    for (i, r) in rects.iter().copied().enumerate() {
        let _ = tree.create_proxy(r, i as u32);
    }
    tree
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[32usize, 64, 128] {
        let rects = gen_grid_rects(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter_batched(
                || rects.clone(),
                |rects| {
                    let tree = build_tree(&rects);
                    black_box(tree.height());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let rects = gen_random_rects(4096, 2000.0, 2000.0, 12.0, 12.0);
    group.bench_function("random_4096", |b| {
        b.iter_batched(
            || rects.clone(),
            |rects| {
                let tree = build_tree(&rects);
                black_box(tree.height());
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_move_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_churn");
    let rects = gen_grid_rects(64, 10.0);
    group.throughput(Throughput::Elements(rects.len() as u64));

    // Jitter within the fat margin: almost every move is a no-op.
    group.bench_function("small_jitter", |b| {
        b.iter_batched(
            || {
                let mut tree = DynamicTree::new();
                let ids: Vec<_> = rects
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (tree.create_proxy(*r, i as u32), *r))
                    .collect();
                (tree, ids)
            },
            |(mut tree, ids)| {
                let mut moved = 0usize;
                for (id, r) in ids {
                    let d = Vec2::new(0.02, -0.02);
                    if tree.move_proxy(id, r + d, d) {
                        moved += 1;
                    }
                }
                black_box(moved);
            },
            BatchSize::SmallInput,
        )
    });

    // Teleporting moves: every one removes and reinserts.
    group.bench_function("teleport", |b| {
        b.iter_batched(
            || {
                let mut tree = DynamicTree::new();
                let ids: Vec<_> = rects
                    .iter()
                    .enumerate()
                    .map(|(i, r)| tree.create_proxy(*r, i as u32))
                    .collect();
                (tree, ids)
            },
            |(mut tree, ids)| {
                let mut rng = Rng::new(0xBADC_F00D_1234_5678);
                for id in ids {
                    let x = rng.next_f64() * 640.0;
                    let y = rng.next_f64() * 640.0;
                    let moved =
                        tree.move_proxy(id, Rect::new(x, y, x + 10.0, y + 10.0), Vec2::ZERO);
                    black_box(moved);
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    for &n in &[64usize, 128] {
        let rects = gen_grid_rects(n, 8.0);
        let tree = build_tree(&rects);
        group.throughput(Throughput::Elements(256));
        group.bench_function(format!("viewport_sweep_n{}", n), |b| {
            b.iter(|| {
                let mut total = 0usize;
                for q in 0..256 {
                    let x = (q % 64) as f64 * 8.0;
                    let y = (q / 64) as f64 * 8.0;
                    tree.query(Rect::new(x, y, x + 64.0, y + 64.0), |_| {
                        total += 1;
                        true
                    });
                }
                black_box(total);
            })
        });
    }

    let rects = gen_clustered_rects(16, 256, 128.0);
    let tree = build_tree(&rects);
    group.bench_function("clustered", |b| {
        b.iter(|| {
            let mut total = 0usize;
            tree.query(Rect::new(800.0, 800.0, 1200.0, 1200.0), |_| {
                total += 1;
                true
            });
            black_box(total);
        })
    });
    group.finish();
}

fn bench_ray_cast(c: &mut Criterion) {
    let mut group = c.benchmark_group("ray_cast");
    let rects = gen_grid_rects(64, 10.0);
    let tree = build_tree(&rects);
    group.throughput(Throughput::Elements(64));

    group.bench_function("closest_hit_sweep", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for row in 0..64 {
                let y = row as f64 * 10.0 + 5.0;
                let input = RayCastInput {
                    p1: Point::new(-10.0, y),
                    p2: Point::new(650.0, y),
                    max_fraction: 1.0,
                };
                tree.ray_cast(&input, |sub, id| {
                    hits += 1;
                    let t = (tree.fat_aabb(id).x0 - sub.p1.x) / (sub.p2.x - sub.p1.x);
                    t.max(0.001)
                });
            }
            black_box(hits);
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_move_churn,
    bench_query,
    bench_ray_cast,
);
criterion_main!(benches);
