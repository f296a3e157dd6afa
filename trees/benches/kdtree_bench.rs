use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gdsc_trees::{DistanceMetric, KdTree2D, KdTreeConfig, SquaredEuclidean};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

/// Uniform localisations over a 512x512 pixel field
fn generate_points(n: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| [rng.random_range(0.0..512.0), rng.random_range(0.0..512.0)])
        .collect()
}

fn build_tree(points: &[[f64; 2]], config: KdTreeConfig) -> KdTree2D<usize> {
    let mut tree = match KdTree2D::<usize>::with_config(config) {
        Ok(tree) => tree,
        Err(_) => return KdTree2D::<usize>::new(),
    };
    for (i, p) in points.iter().enumerate() {
        let _ = tree.add_point(*p, i);
    }
    tree
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_build");

    for &n in &[1_000usize, 10_000, 100_000] {
        let points = generate_points(n, 1);
        group.bench_with_input(BenchmarkId::new("unbounded", n), &points, |b, points| {
            b.iter(|| black_box(build_tree(points, KdTreeConfig::default())))
        });

        let limited = KdTreeConfig {
            size_limit: Some(n / 10),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("size_limited", n), &points, |b, points| {
            b.iter(|| black_box(build_tree(points, limited.clone())))
        });
    }

    group.finish();
}

fn benchmark_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree_nearest");
    let points = generate_points(50_000, 2);
    let queries = generate_points(1_000, 3);

    for &bucket_size in &[8usize, 24, 64] {
        let tree = build_tree(
            &points,
            KdTreeConfig {
                bucket_size,
                ..Default::default()
            },
        );
        for &k in &[1usize, 10] {
            group.bench_with_input(
                BenchmarkId::new(format!("bucket={}", bucket_size), k),
                &k,
                |b, &k| {
                    b.iter(|| {
                        for q in &queries {
                            black_box(tree.nearest_neighbours(q, k, true));
                        }
                    })
                },
            );
        }
    }

    // Exhaustive scan for scale
    group.bench_function("brute_force/1", |b| {
        b.iter(|| {
            for q in &queries {
                let best = points
                    .iter()
                    .map(|p| SquaredEuclidean.distance(q, p))
                    .fold(f64::INFINITY, f64::min);
                black_box(best);
            }
        })
    });

    let tree = build_tree(&points, KdTreeConfig::default());
    group.bench_function("batch/10", |b| {
        b.iter(|| black_box(tree.nearest_neighbours_batch(&queries, 10, true)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_build, benchmark_nearest);
criterion_main!(benches);
