//! Criterion micro-benchmarks for spatial queries.

use criterion::{criterion_group, criterion_main, Criterion};
use scenegen_core::{ObjectId, Vec3};
use scenegen_space::{Cell, Footprint, NavGrid, ObjectBounds, RegionKind, RoomGrid, SpatialIndex, ToolKind};
use std::hint::black_box;

/// A 30x30 room with a lava band and a grid of placed boxes.
fn busy_index() -> SpatialIndex {
    let room = RoomGrid::new(30, 5, 30).unwrap();
    let mut index = SpatialIndex::new(room);
    let band: Vec<Cell> = (-14..=14).map(|x| Cell::new(x, 3)).collect();
    index.add_region(RegionKind::Lava, band).unwrap();
    let mut id = 0;
    for z in (-12..=12).step_by(4) {
        for x in (-12..=12).step_by(4) {
            if z == 4 {
                continue;
            }
            let bounds = ObjectBounds::new(Vec3::new(x as f64, 0.0, z as f64), Vec3::new(1.2, 1.0, 0.8), 30.0);
            index.insert_object(ObjectId(id), bounds);
            id += 1;
        }
    }
    index
}

/// Benchmark: flood fill over every cell of a 30x30 room.
fn bench_flood_30x30(c: &mut Criterion) {
    let nav = NavGrid::from_index(&busy_index());

    c.bench_function("flood_30x30", |b| {
        b.iter(|| {
            let seen = nav.flood(Cell::new(0, -14));
            black_box(&seen);
        });
    });
}

/// Benchmark: 2x2 free-cell search excluding hazards.
fn bench_find_free_cells(c: &mut Criterion) {
    let index = busy_index();

    c.bench_function("find_free_cells_2x2", |b| {
        b.iter(|| {
            let cells = index.find_free_cells(&[RegionKind::Lava, RegionKind::Hole], 2);
            black_box(&cells);
        });
    });
}

/// Benchmark: collision test of 1000 rotated candidates.
fn bench_collision_1000(c: &mut Criterion) {
    let index = busy_index();
    let candidates: Vec<ObjectBounds> = (0u64..1000)
        .map(|i| {
            let x = (i.wrapping_mul(6364136223846793007) % 280) as f64 / 10.0 - 14.0;
            let z = (i.wrapping_mul(1442695040888963407) % 280) as f64 / 10.0 - 14.0;
            ObjectBounds::new(Vec3::new(x, 0.0, z), Vec3::new(0.6, 0.6, 0.6), (i % 8) as f64 * 45.0)
        })
        .collect();

    c.bench_function("collision_1000", |b| {
        b.iter(|| {
            let free = candidates.iter().filter(|bounds| index.is_free(bounds)).count();
            black_box(free);
        });
    });
}

/// Benchmark: sweep a hooked tool six cells forward in all four headings.
fn bench_tool_sweep(c: &mut Criterion) {
    let tool = Footprint::tool(ToolKind::Hooked, 6).unwrap();
    let rotations: Vec<Footprint> = (0..4).map(|t| tool.rotated(t)).collect();

    c.bench_function("tool_sweep_hooked_6", |b| {
        b.iter(|| {
            for f in &rotations {
                let cells = f.swept_cells(Cell::new(0, 0), 6);
                black_box(&cells);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_flood_30x30,
    bench_find_free_cells,
    bench_collision_1000,
    bench_tool_sweep
);
criterion_main!(benches);
