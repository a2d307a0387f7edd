//! Criterion micro-benchmarks for arena construction, pool traffic, guard
//! checks and road index rebuilds.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use sprawl_arena::{CheckLevel, GridArena};
use sprawl_bench::{reference_profile, synthetic_roads};
use sprawl_core::{owner, GridKind};
use sprawl_test_utils::with_level;

/// Benchmark: build the reference 10K-pixel arena.
fn bench_arena_new_10k(c: &mut Criterion) {
    c.bench_function("arena_new_10k", |b| {
        b.iter(|| {
            let arena = GridArena::new(reference_profile()).unwrap();
            black_box(arena.raw_bytes().len());
        });
    });
}

/// Benchmark: acquire and release one Working grid.
fn bench_working_round_trip(c: &mut Criterion) {
    let mut arena = GridArena::new(reference_profile()).unwrap();
    c.bench_function("working_round_trip", |b| {
        b.iter(|| {
            let h = arena
                .acquire(GridKind::Working, owner!("bench"))
                .unwrap();
            arena.release(black_box(h), owner!("bench")).unwrap();
        });
    });
}

/// Benchmark: the same round trip with strict invalidation on.
fn bench_working_round_trip_strict(c: &mut Criterion) {
    let config = with_level(reference_profile(), CheckLevel::Strict);
    let mut arena = GridArena::new(config).unwrap();
    c.bench_function("working_round_trip_strict", |b| {
        b.iter(|| {
            let h = arena
                .acquire(GridKind::Working, owner!("bench"))
                .unwrap();
            arena.release(black_box(h), owner!("bench")).unwrap();
        });
    });
}

/// Benchmark: full memory check on the reference arena.
fn bench_check_memory(c: &mut Criterion) {
    let config = with_level(reference_profile(), CheckLevel::Strict);
    let mut arena = GridArena::new(config).unwrap();
    c.bench_function("check_memory_strict_10k", |b| {
        b.iter(|| {
            arena.check_memory(owner!("bench")).unwrap();
        });
    });
}

/// Benchmark: rebuild the road index from a 10K-pixel road grid.
fn bench_road_rebuild(c: &mut Criterion) {
    let mut arena = GridArena::new(reference_profile()).unwrap();
    let roads = synthetic_roads(100, 100, 8, 42);
    let road_pixels = roads.iter().filter(|&&p| p != 0).count();
    arena.allocate_road_columns(road_pixels).unwrap();
    let h = arena.acquire(GridKind::Input, owner!("bench")).unwrap();
    arena.grid_mut(&h).unwrap().copy_from_slice(&roads);
    c.bench_function("road_rebuild_10k", |b| {
        b.iter(|| {
            black_box(arena.rebuild_road_index(&h).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_arena_new_10k,
    bench_working_round_trip,
    bench_working_round_trip_strict,
    bench_check_memory,
    bench_road_rebuild
);
criterion_main!(benches);
