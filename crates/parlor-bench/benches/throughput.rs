//! Throughput benchmarks for Parlor.
//!
//! These benchmarks measure how reads scale with the size of the message log.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parlor_bench::{populated_service, user};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// Benchmark visibility-filtered reads over growing logs.
fn bench_list_messages(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut group = c.benchmark_group("list_messages");

    for size in [1_000usize, 10_000, 100_000] {
        let (service, _clock) = runtime.block_on(populated_service(100, size));
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("unbounded", size), &size, |b, _| {
            b.to_async(&runtime)
                .iter(|| async { black_box(service.router.list(&user(7), None).await.unwrap()) });
        });

        group.bench_with_input(BenchmarkId::new("limit_50", size), &size, |b, _| {
            b.to_async(&runtime)
                .iter(|| async { black_box(service.router.list(&user(7), Some(50)).await.unwrap()) });
        });
    }

    group.finish();
}

/// Benchmark sweeping a large population.
fn bench_sweep(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sweep");

    for participants in [100usize, 1_000] {
        group.throughput(Throughput::Elements(participants as u64));
        group.bench_with_input(
            BenchmarkId::new("evict_all", participants),
            &participants,
            |b, &participants| {
                b.to_async(&runtime).iter_custom(|iters| async move {
                    let mut total = Duration::ZERO;
                    for _ in 0..iters {
                        let (service, clock) = populated_service(participants, 0).await;
                        clock.advance(Duration::from_secs(60));

                        let start = Instant::now();
                        black_box(service.sweeper.run_cycle().await.unwrap());
                        total += start.elapsed();
                    }
                    total
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_list_messages, bench_sweep);
criterion_main!(benches);
