//! Benchmarks for gap and swing detection.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ictpd::prelude::*;

/// Generate a deterministic 1-minute random walk with occasional jumps
fn generate_bars(n: usize) -> Vec<Bar> {
  let open = NaiveDate::from_ymd_opt(2025, 10, 29).unwrap().and_hms_opt(9, 30, 0).unwrap();
  let mut bars = Vec::with_capacity(n);
  let mut price = 20000.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 10.0 - 5.0; // Deterministic "random"
    let jump = if i % 17 == 0 { 12.0 } else if i % 23 == 0 { -12.0 } else { 0.0 };
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o = price + jump;
    let c = o + change;
    let h = o.max(c) + volatility * 0.5;
    let l = o.min(c) - volatility * 0.5;

    bars.push(Bar::new(open + Duration::minutes(i as i64), o, h, l, c, 1000));
    price = c;
  }

  bars
}

fn bench_gaps(c: &mut Criterion) {
  let bars = generate_bars(1000);
  let strict = StrictGapDetector::with_defaults();
  let extended = ExtendedGapDetector::with_defaults();

  c.bench_function("scan_gaps_strict_1000_bars", |b| {
    b.iter(|| black_box(strict.scan(black_box(&bars))))
  });
  c.bench_function("scan_gaps_extended_1000_bars", |b| {
    b.iter(|| black_box(extended.scan(black_box(&bars))))
  });
}

fn bench_runs(c: &mut Criterion) {
  let bars = generate_bars(1000);
  let extremum = ExtremumRunDetector::with_defaults();
  let body = BodyRunDetector::with_defaults();

  c.bench_function("scan_runs_extremum_1000_bars", |b| {
    b.iter(|| black_box(extremum.scan(black_box(&bars))))
  });
  c.bench_function("scan_runs_body_1000_bars", |b| {
    b.iter(|| black_box(body.scan(black_box(&bars))))
  });
}

fn bench_scaling(c: &mut Criterion) {
  let engine = EngineBuilder::new().build();

  let mut group = c.benchmark_group("scaling");

  for size in [100, 1000, 10000, 100000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("gaps", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(engine.scan_gaps(black_box(&bars)));
      })
    });
    group.bench_with_input(BenchmarkId::new("runs", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(engine.scan_runs(black_box(&bars)));
      })
    });
  }

  group.finish();
}

fn bench_scoped(c: &mut Criterion) {
  let bars = generate_bars(100000);
  let composer = ScopedComposer::new(BodyRunDetector::new(2, 0.0).unwrap(), ExtendedGapDetector::with_defaults());

  let mut group = c.benchmark_group("scoped_100000_bars");
  group.bench_function("sequential", |b| {
    b.iter(|| black_box(composer.scan_grouped(black_box(&bars))))
  });
  group.bench_function("parallel", |b| {
    let composer = composer.parallel(true);
    b.iter(|| black_box(composer.scan_grouped(black_box(&bars))))
  });
  group.finish();
}

fn bench_min_size_sweep(c: &mut Criterion) {
  let bars = generate_bars(10000);
  let meta = &ExtendedGapDetector::param_meta()[0];

  let mut group = c.benchmark_group("min_size_sweep");
  for size in meta.generate_grid() {
    let params = HashMap::from([(meta.name, size)]);
    let detector = ExtendedGapDetector::with_params(&params).unwrap();

    group.bench_with_input(BenchmarkId::new("gaps", size), &size, |b, _| {
      b.iter(|| black_box(detector.scan(black_box(&bars))))
    });
  }
  group.finish();
}

criterion_group!(benches, bench_gaps, bench_runs, bench_scaling, bench_scoped, bench_min_size_sweep);

criterion_main!(benches);
