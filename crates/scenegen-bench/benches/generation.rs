//! Criterion benchmarks for whole-scene generation.

use criterion::{criterion_group, criterion_main, Criterion};
use scenegen_bench::{puzzle_profile, reference_profile, seeds, stress_profile};
use scenegen_engine::{generate_batch, plan, GenerationOptions, SceneGenerator};
use std::hint::black_box;

fn bench_reference_scene(c: &mut Criterion) {
    let generator = SceneGenerator::with_defaults(reference_profile()).unwrap();
    let seeds = seeds(64, 42);
    let mut i = 0;

    c.bench_function("generate_reference", |b| {
        b.iter(|| {
            let scene = generator.generate(seeds[i % seeds.len()]);
            i += 1;
            black_box(&scene);
        });
    });
}

fn bench_stress_scene(c: &mut Criterion) {
    let generator = SceneGenerator::with_defaults(stress_profile()).unwrap();
    let mut seed = 0u64;

    c.bench_function("generate_stress", |b| {
        b.iter(|| {
            seed += 1;
            let scene = generator.generate(seed);
            black_box(&scene);
        });
    });
}

fn bench_tool_puzzle(c: &mut Criterion) {
    let generator = SceneGenerator::with_defaults(puzzle_profile()).unwrap();
    let mut seed = 0u64;

    c.bench_function("generate_tool_puzzle", |b| {
        b.iter(|| {
            seed += 1;
            let scene = generator.generate(seed);
            black_box(&scene);
        });
    });
}

/// Planning alone, without scheduling, validation or assembly.
fn bench_plan_only(c: &mut Criterion) {
    let config = reference_profile();
    let options = GenerationOptions::default();
    let mut seed = 0u64;

    c.bench_function("plan_reference", |b| {
        b.iter(|| {
            seed += 1;
            let plan = plan(&config, &options, seed);
            black_box(plan.is_ok());
        });
    });
}

fn bench_batch_32(c: &mut Criterion) {
    let generator = SceneGenerator::with_defaults(reference_profile()).unwrap();
    let mut group = c.benchmark_group("batch_32");
    group.sample_size(10);
    for workers in [1usize, 4] {
        group.bench_function(format!("workers_{workers}"), |b| {
            b.iter(|| {
                let scenes = generate_batch(&generator, 7, 32, workers);
                black_box(scenes.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_reference_scene,
    bench_stress_scene,
    bench_tool_puzzle,
    bench_plan_only,
    bench_batch_32
);
criterion_main!(benches);
