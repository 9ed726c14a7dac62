//! Benchmarks for position computation and configuration resolution.

use criterion::{Criterion, criterion_group, criterion_main};
use mlayer_core::position::compute;
use mlayer_core::{LayerKind, ModalConfig, resolve};
use std::hint::black_box;

fn bench_position(c: &mut Criterion) {
    let mut group = c.benchmark_group("position");
    for spec in ["center", "bottom-20", "120", "left-15", "nonsense"] {
        group.bench_function(spec, |b| {
            b.iter(|| compute(black_box(spec), black_box(800.0), black_box(300.0)))
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let global = ModalConfig::global_defaults();
    let defaults = LayerKind::Confirm.defaults();
    c.bench_function("resolve/confirm", |b| {
        b.iter(|| {
            let caller = ModalConfig::new().title("Delete?").cancel_text(false);
            resolve(black_box(&defaults), caller, black_box(&global))
        })
    });
}

criterion_group!(benches, bench_position, bench_resolve);
criterion_main!(benches);
