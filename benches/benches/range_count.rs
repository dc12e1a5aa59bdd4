// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Counting-pass throughput: flat vector vs uniform grid backends.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kurbo::Point;
use nearfield_index::backends::GridF64;
use nearfield_proximity::{Proxy, ProxySet};

/// Deterministic scatter over the ±80 play-area scale.
fn scatter(n: usize) -> Vec<Point> {
    let mut lcg = 0xcafe_f00d_u32;
    let mut next = move || {
        lcg = lcg.wrapping_mul(1664525).wrapping_add(1013904223);
        (f64::from(lcg >> 8) / f64::from(1_u32 << 24)) * 160.0 - 80.0
    };
    (0..n).map(|_| Point::new(next(), next())).collect()
}

fn bench_update_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_counts");
    for &n in &[64_usize, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("flatvec", n), &n, |b, &n| {
            let mut set = ProxySet::new();
            for p in scatter(n) {
                set.insert(Proxy::at(p).with_range(10.0));
            }
            b.iter(|| set.update_counts());
        });
        group.bench_with_input(BenchmarkId::new("grid", n), &n, |b, &n| {
            let mut set = ProxySet::with_backend(GridF64::new(20.0));
            for p in scatter(n) {
                set.insert(Proxy::at(p).with_range(10.0));
            }
            b.iter(|| set.update_counts());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_update_counts);
criterion_main!(benches);
