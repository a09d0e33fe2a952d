//! # View Iteration Benchmark
//!
//! The per-tick hot path: walk every entity with Position and Velocity and
//! integrate. Compared against a raw slice loop (theoretical minimum) and
//! against a direct walk over the pool's dense arrays.
//!
//! Run with: `cargo bench --package strata_core --bench view_benchmark`

// Benchmarks don't need docs and only read some component fields
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::{Manager, TypeRegistry};

const ENTITY_COUNT: usize = 100_000;
const DT: f32 = 0.016;

#[derive(Clone, Copy, Debug, Default)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Debug, Default)]
struct Sleeping;

/// Every entity moves; every fourth one is also asleep.
fn world() -> Manager {
    let mut manager = Manager::with_registry(TypeRegistry::new());
    for i in 0..ENTITY_COUNT {
        let entity = manager.create_entity();
        let f = i as f32;
        manager.add(entity, Position { x: f, y: f, z: f });
        manager.add(entity, Velocity { x: 0.1, y: 0.2, z: 0.3 });
        if i % 4 == 0 {
            manager.add(entity, Sleeping);
        }
    }
    manager.refresh();
    manager
}

fn bench_view_read(c: &mut Criterion) {
    let manager = world();
    let mut group = c.benchmark_group("view_read");

    group.bench_function("all_100K", |b| {
        b.iter(|| black_box(manager.entities().count()));
    });

    group.bench_function("with_pos_vel_100K", |b| {
        b.iter(|| {
            let mut sum = 0.0_f32;
            for (_, (pos, vel)) in manager.entities_with::<(Position, Velocity)>() {
                sum += pos.x * vel.x;
            }
            black_box(sum)
        });
    });

    group.bench_function("without_sleeping_100K", |b| {
        b.iter(|| black_box(manager.entities_without::<(Sleeping,)>().count()));
    });

    group.finish();
}

fn bench_view_write(c: &mut Criterion) {
    let mut manager = world();
    let mut group = c.benchmark_group("view_write");

    group.bench_function("integrate_100K", |b| {
        b.iter(|| {
            let mut view = manager.entities_with_mut::<(Position, Velocity)>();
            while let Some((_, (pos, vel))) = view.next() {
                pos.x += vel.x * DT;
                pos.y += vel.y * DT;
                pos.z += vel.z * DT;
            }
        });
    });

    group.bench_function("dense_components_100K", |b| {
        b.iter(|| {
            let mut sum = 0.0_f32;
            if let Some(pool) = manager.pool::<Position>() {
                for pos in pool.components() {
                    sum += pos.x;
                }
            }
            black_box(sum)
        });
    });

    group.finish();
}

/// Raw slice iteration (theoretical minimum).
fn bench_raw_slice(c: &mut Criterion) {
    let mut positions = vec![Position::default(); ENTITY_COUNT];
    let velocities = vec![Velocity { x: 0.1, y: 0.2, z: 0.3 }; ENTITY_COUNT];

    c.bench_function("raw_slice_100K", |b| {
        b.iter(|| {
            for (pos, vel) in positions.iter_mut().zip(&velocities) {
                pos.x += vel.x * DT;
                pos.y += vel.y * DT;
                pos.z += vel.z * DT;
            }
            black_box(positions.len())
        });
    });
}

criterion_group!(benches, bench_view_read, bench_view_write, bench_raw_slice);

criterion_main!(benches);
