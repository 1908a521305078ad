//! Criterion benchmarks for the transport simulator.
//!
//! Two benchmark groups:
//! - `long_line`: 500 single-cell belts, saturated by the spawner
//! - `resync`: rebuilding segments on a loaded grid after one removal

use criterion::{Criterion, criterion_group, criterion_main};
use foundry_core::config::{FactoryConfig, SimConfig};
use foundry_core::factory::Factory;
use foundry_core::test_utils::*;
use foundry_spatial::{GridPosition, Layer, Rotation, TileKind};

/// A straight east-facing line of `len` belts with the default spawner,
/// run until items reach the far end.
fn build_loaded_line(len: i32) -> Factory {
    let config = FactoryConfig {
        sim: SimConfig::default(),
        ..quiet_config()
    };
    let mut f = Factory::new(config).unwrap();
    for x in 0..len {
        f.place(GridPosition::new(x, 0), TileKind::Single, Layer::Belt, Rotation::East)
            .unwrap();
    }
    for _ in 0..(len as usize * 30) {
        f.step();
    }
    f
}

/// A 20x20 block of north-facing columns, every belt carrying one item.
fn build_loaded_grid() -> Factory {
    let mut f = Factory::new(quiet_config()).unwrap();
    for x in 0..20 {
        for y in 0..20 {
            f.place(GridPosition::new(x, y), TileKind::Single, Layer::Belt, Rotation::North)
                .unwrap();
            f.spawn_item(GridPosition::new(x, y), ore()).unwrap();
        }
    }
    f
}

fn bench_long_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_line");
    group.sample_size(50);

    let mut f = build_loaded_line(500);
    group.bench_function("step_500_belts", |b| {
        b.iter(|| f.step());
    });

    group.finish();
}

fn bench_resync(c: &mut Criterion) {
    let mut group = c.benchmark_group("resync");
    group.sample_size(30);

    group.bench_function("remove_and_replace_400_belts", |b| {
        let mut f = build_loaded_grid();
        let cell = GridPosition::new(10, 10);
        b.iter(|| {
            f.remove(cell, Layer::Belt).unwrap();
            f.place(cell, TileKind::Single, Layer::Belt, Rotation::North)
                .unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_long_line, bench_resync);
criterion_main!(benches);
