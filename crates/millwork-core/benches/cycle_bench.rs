//! Benchmarks for advancing production cycles.
//!
//! - `advance_single`: one sawmill ticking at 60 Hz
//! - `advance_batch_1000`: a thousand mixed buildings through the driver

use criterion::{Criterion, criterion_group, criterion_main};
use millwork_core::cycle::ProductionCycle;
use millwork_core::driver::advance_all;
use millwork_core::fixed::Fixed64;
use millwork_core::test_utils::*;

const FRAME: f64 = 1.0 / 60.0;

/// A thousand buildings: sawmills fed from stockpiles and quarries that
/// generate stone from nothing.
fn build_town() -> Vec<ProductionCycle> {
    (0..1000)
        .map(|i| {
            if i % 2 == 0 {
                make_cycle(
                    make_sawmill(3.0 + (i % 7) as f64, 1),
                    Some(make_stockpile(&[(log(), 5000)])),
                    Some(make_bin(plank(), 5000)),
                )
            } else {
                make_cycle(make_generator(stone(), 2.0), None, Some(make_bin(stone(), 5000)))
            }
        })
        .collect()
}

fn bench_advance_single(c: &mut Criterion) {
    let mut cycle = make_cycle(
        make_sawmill(5.0, 1),
        Some(make_stockpile(&[(log(), 5000)])),
        Some(make_bin(plank(), 5000)),
    );
    let frame = Fixed64::from_num(FRAME);
    c.bench_function("advance_single", |b| {
        b.iter(|| cycle.advance(frame).unwrap());
    });
}

fn bench_advance_batch(c: &mut Criterion) {
    let mut town = build_town();
    let frame = Fixed64::from_num(FRAME);
    c.bench_function("advance_batch_1000", |b| {
        b.iter(|| advance_all(&mut town, frame).unwrap());
    });
}

criterion_group!(benches, bench_advance_single, bench_advance_batch);
criterion_main!(benches);
