//! Benchmarks for triangulation and mesh generation.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera::prelude::*;

fn random_points(n: usize, seed: u64) -> Vec<Point2<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
        .collect()
}

fn bench_delaunay_insertion(c: &mut Criterion) {
    for n in [100, 1_000, 10_000] {
        let points = random_points(n, 42);
        c.bench_function(&format!("delaunay_insert_{n}"), |b| {
            b.iter(|| {
                let mut tri =
                    Triangulation::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).unwrap();
                for &p in &points {
                    tri.insert(p).unwrap();
                }
                tri
            });
        });
    }
}

fn bench_point_location(c: &mut Criterion) {
    let points = random_points(10_000, 42);
    let mut tri = Triangulation::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)).unwrap();
    for &p in &points {
        tri.insert(p).unwrap();
    }
    let queries = random_points(1_000, 7);

    c.bench_function("locate_1000_in_10000", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for &q in &queries {
                if tri.locate(q).is_some() {
                    hits += 1;
                }
            }
            hits
        });
    });
}

fn bench_eikmesh_generate(c: &mut Criterion) {
    let bounds = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));

    c.bench_function("eikmesh_unit_square_h0_0.1", |b| {
        b.iter(|| {
            EikMesh::new(
                bounds,
                Uniform,
                bounds,
                &[],
                EikMeshOptions::new(0.1).with_max_steps(50),
            )
            .unwrap()
            .generate()
            .unwrap()
        });
    });
}

fn bench_relaxation_step(c: &mut Criterion) {
    let bounds = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));

    for parallel in [false, true] {
        let name = if parallel {
            "eikmesh_step_parallel"
        } else {
            "eikmesh_step_sequential"
        };
        c.bench_function(name, |b| {
            let mut options = EikMeshOptions::new(0.02);
            options.parallel = parallel;
            let mut gen = EikMesh::new(bounds, Uniform, bounds, &[], options).unwrap();
            b.iter(|| gen.improve().unwrap());
        });
    }
}

criterion_group!(
    benches,
    bench_delaunay_insertion,
    bench_point_location,
    bench_eikmesh_generate,
    bench_relaxation_step
);
criterion_main!(benches);
