use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use request_throttle::{RateLimitConfig, RequestThrottle, ServiceCategory};
use std::time::Duration;

/// Benchmark the hot decision path with plenty of headroom.
fn bench_check_within_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_request");
    group.throughput(Throughput::Elements(1));

    let throttle = RequestThrottle::builder()
        .with_limit(
            ServiceCategory::Telemetry,
            RateLimitConfig::new(
                1_000_000,
                Duration::from_secs(10),
                10_000_000,
                Duration::from_secs(60),
            )
            .unwrap(),
        )
        .build()
        .unwrap();

    group.bench_function("within_limits", |b| {
        b.iter(|| throttle.check_request(black_box(ServiceCategory::Telemetry)))
    });

    group.finish();
}

/// Benchmark the short-circuit taken while the breaker is open.
fn bench_check_denied(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_request_denied");
    group.throughput(Throughput::Elements(1));

    let throttle = RequestThrottle::builder()
        .with_limit(
            ServiceCategory::BulkWrite,
            RateLimitConfig::new(
                1_000_000,
                Duration::from_secs(10),
                10,
                Duration::from_secs(3600),
            )
            .unwrap(),
        )
        .build()
        .unwrap();

    // Fill the rate window and trip the breaker
    for _ in 0..11 {
        throttle.check_request(ServiceCategory::BulkWrite);
    }

    group.bench_function("breaker_open", |b| {
        b.iter(|| throttle.check_request(black_box(ServiceCategory::BulkWrite)))
    });

    group.finish();
}

/// Benchmark the read-only stats snapshot.
fn bench_stats(c: &mut Criterion) {
    let throttle = RequestThrottle::new();
    for _ in 0..100 {
        throttle.check_request(ServiceCategory::Telemetry);
    }

    c.bench_function("stats_snapshot", |b| b.iter(|| black_box(throttle.stats())));
}

criterion_group!(
    benches,
    bench_check_within_limits,
    bench_check_denied,
    bench_stats
);
criterion_main!(benches);
