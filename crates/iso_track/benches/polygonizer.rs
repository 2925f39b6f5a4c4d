mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use iso_track::models;
use iso_track::polygonizer::{Resolution, SurfaceTracker, TrackerConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_model(c: &mut Criterion, name: &str, make_tracker: impl Fn() -> SurfaceTracker) {
    let mut group = c.benchmark_group(name);

    // Preview a run so throughput reads in "voxels per iteration".
    let mut preview = make_tracker();
    preview.construct_lattice();
    group.throughput(common::elements_throughput(
        preview.lattice().voxel_count(),
    ));

    group.bench_function("construct_lattice", |b| {
        b.iter_batched(
            &make_tracker,
            |mut tracker| {
                tracker.construct_lattice();
                black_box(tracker.lattice().voxel_count())
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_sphere(c: &mut Criterion) {
    bench_model(c, "sphere_low", || {
        SurfaceTracker::try_new(
            models::sphere(1.0),
            "sphere",
            TrackerConfig::new(Resolution::LOW),
        )
        .expect("valid model")
    });
}

fn bench_peanut(c: &mut Criterion) {
    bench_model(c, "peanut_low", || {
        SurfaceTracker::try_new(
            models::peanut(),
            "peanut",
            TrackerConfig::new(Resolution::LOW),
        )
        .expect("valid model")
    });
}

fn bench_particles(c: &mut Criterion) {
    bench_model(c, "particles_32", || {
        let mut rng = StdRng::seed_from_u64(0xD3ADB33F);
        SurfaceTracker::try_new(
            models::particles(32, 2.0, &mut rng),
            "particles",
            TrackerConfig::new(Resolution::LOW),
        )
        .expect("valid model")
    });
}

criterion_group! {
    name = polygonizer;
    config = common::default_criterion();
    targets = bench_sphere, bench_peanut, bench_particles
}
criterion_main!(polygonizer);
