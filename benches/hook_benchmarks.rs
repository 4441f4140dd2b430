//! Criterion benchmarks for logstream_hook

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use logstream_hook::backend::{LogStreamClient, MemoryLogStreams};
use logstream_hook::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn backend() -> Arc<MemoryLogStreams> {
    let backend = Arc::new(MemoryLogStreams::new());
    backend.create_log_group("bench");
    backend
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let formatter = JsonFormatter::new();
    let plain = LogEntry::new(LogLevel::Info, "Request handled");
    let structured = LogEntry::new(LogLevel::Info, "Request handled")
        .with_field("method", "GET")
        .with_field("path", "/api/v1/items")
        .with_field("status", 200)
        .with_field("latency_ms", 12.5);

    group.bench_function("plain", |b| {
        b.iter(|| black_box(formatter.format(black_box(&plain))))
    });

    group.bench_function("structured", |b| {
        b.iter(|| black_box(formatter.format(black_box(&structured))))
    });

    group.finish();
}

// ============================================================================
// Fire Benchmarks
// ============================================================================

fn bench_sync_fire(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_fire");
    group.throughput(Throughput::Elements(1));

    let backend = backend();
    let hook = LogStreamHook::builder("bench", "sync")
        .build(backend as Arc<dyn LogStreamClient>)
        .unwrap();
    let entry = LogEntry::new(LogLevel::Info, "Sync message");

    group.bench_function("info", |b| {
        b.iter(|| hook.fire(black_box(&entry)).unwrap())
    });

    group.finish();
}

fn bench_batched_fire(c: &mut Criterion) {
    let mut group = c.benchmark_group("batched_fire");
    group.throughput(Throughput::Elements(1));

    let backend = backend();
    let hook = LogStreamHook::builder("bench", "batched")
        .batch_interval(Duration::from_millis(10))
        .build(backend as Arc<dyn LogStreamClient>)
        .unwrap();
    let entry = LogEntry::new(LogLevel::Info, "Batched message");

    group.bench_function("info", |b| {
        b.iter(|| hook.fire(black_box(&entry)).unwrap())
    });

    group.finish();
    hook.shutdown(Duration::from_secs(10)).unwrap();
}

// ============================================================================
// Concurrent Benchmarks
// ============================================================================

fn bench_concurrent_fire(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_fire");

    let backend = backend();
    let hook = Arc::new(
        LogStreamHook::builder("bench", "concurrent")
            .batch_interval(Duration::from_millis(10))
            .build(backend as Arc<dyn LogStreamClient>)
            .unwrap(),
    );

    group.throughput(Throughput::Elements(400));
    group.bench_function("multi_thread_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let hook = Arc::clone(&hook);
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            hook.fire(&LogEntry::new(LogLevel::Info, "Concurrent message"))
                                .unwrap();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    group.finish();
    hook.shutdown(Duration::from_secs(10)).unwrap();
}

criterion_group!(
    benches,
    bench_formatting,
    bench_sync_fire,
    bench_batched_fire,
    bench_concurrent_fire,
);
criterion_main!(benches);
