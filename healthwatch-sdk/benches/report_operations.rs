use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use healthwatch_sdk::Provider;

/// Benchmark repeated ok() on one identity (hot path)
fn bench_report_ok(c: &mut Criterion) {
    let provider = Provider::new();
    let reporter = provider.for_path("bench.module").unwrap();

    c.bench_function("report_ok", |b| {
        b.iter(|| {
            reporter.ok(black_box("running")).unwrap();
        });
    });
}

/// Benchmark alternating levels, which moves the row between index buckets
fn bench_report_level_flapping(c: &mut Criterion) {
    let provider = Provider::new();
    let reporter = provider.for_path("bench.module").unwrap();

    c.bench_function("report_level_flapping", |b| {
        b.iter(|| {
            reporter.ok(black_box("up")).unwrap();
            reporter
                .degraded(black_box("down"), black_box("timeout"))
                .unwrap();
        });
    });
}

/// Benchmark a single report against tables of varying size (should stay flat)
fn bench_report_varying_table_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_varying_table_size");

    for rows in [10, 1_000, 10_000, 50_000].iter() {
        let provider = Provider::new();
        let module = provider.for_path("bench").unwrap();
        for i in 0..*rows {
            module.new_scope(format!("scope-{}", i)).unwrap().ok("").unwrap();
        }
        let reporter = module.new_scope("scope-0").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, _| {
            b.iter(|| {
                reporter.ok(black_box("tick")).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark scope creation
fn bench_new_scope(c: &mut Criterion) {
    let provider = Provider::new();
    let reporter = provider.for_path("bench.module").unwrap();

    c.bench_function("new_scope", |b| {
        b.iter(|| {
            black_box(reporter.new_scope(black_box("worker")).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_report_ok,
    bench_report_level_flapping,
    bench_report_varying_table_size,
    bench_new_scope
);
criterion_main!(benches);
