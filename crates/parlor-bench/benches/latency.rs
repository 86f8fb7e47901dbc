//! Latency benchmarks for Parlor.
//!
//! These benchmarks focus on the cost of single client actions.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parlor_bench::{empty_service, populated_service, user};
use parlor_protocol::BROADCAST;
use std::time::Instant;
use tokio::runtime::Runtime;

/// Benchmark registration of fresh names.
fn bench_register(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut group = c.benchmark_group("register");

    group.bench_function("fresh_name", |b| {
        b.to_async(&runtime).iter_custom(|iters| async move {
            let (service, _clock) = empty_service();
            let start = Instant::now();
            for i in 0..iters {
                service.presence.register(&user(i as usize)).await.unwrap();
            }
            start.elapsed()
        });
    });

    group.bench_function("conflict", |b| {
        let (service, _clock) = runtime.block_on(populated_service(1, 0));
        b.to_async(&runtime)
            .iter(|| async { black_box(service.presence.register(&user(0)).await.is_err()) });
    });

    group.finish();
}

/// Benchmark send and heartbeat against a populated store.
fn bench_actions(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let (service, _clock) = runtime.block_on(populated_service(1_000, 0));
    let mut group = c.benchmark_group("actions");

    group.bench_function("send_broadcast", |b| {
        b.to_async(&runtime).iter(|| async {
            service
                .router
                .send(&user(42), BROADCAST, "hello", "message")
                .await
                .unwrap()
        });
    });

    group.bench_function("heartbeat", |b| {
        b.to_async(&runtime)
            .iter(|| async { service.presence.heartbeat(&user(42)).await.unwrap() });
    });

    group.finish();
}

criterion_group!(benches, bench_register, bench_actions);
criterion_main!(benches);
