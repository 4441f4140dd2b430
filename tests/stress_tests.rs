//! Stress tests for queue bounds and concurrent producers
//!
//! These tests verify:
//! - No event is lost or duplicated under heavy concurrent load
//! - Every overflow policy behaves as configured on a saturated queue
//! - Shutdown drains a full queue before returning

use logstream_hook::backend::{LogStreamClient, MemoryLogStreams};
use logstream_hook::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn backend() -> Arc<MemoryLogStreams> {
    let backend = Arc::new(MemoryLogStreams::new());
    backend.create_log_group("stress");
    backend
}

fn client(backend: &Arc<MemoryLogStreams>) -> Arc<dyn LogStreamClient> {
    Arc::clone(backend) as Arc<dyn LogStreamClient>
}

/// Hook whose worker is stuck inside a 300ms append when this returns
fn stalled_hook(
    backend: &Arc<MemoryLogStreams>,
    stream: &str,
    capacity: usize,
    policy: OverflowPolicy,
) -> LogStreamHook {
    let hook = LogStreamHook::builder("stress", stream)
        .batch_interval(Duration::from_millis(10))
        .queue_capacity(capacity)
        .overflow_policy(policy)
        .build(client(backend))
        .unwrap();

    backend.set_latency(Duration::from_millis(300));
    // one event to get the worker stuck inside a slow append
    hook.fire(&LogEntry::new(LogLevel::Info, "stall")).unwrap();
    let start = Instant::now();
    while backend.put_count() == 0 {
        assert!(start.elapsed() < Duration::from_secs(2));
        thread::sleep(Duration::from_millis(2));
    }
    hook
}

#[test]
fn test_high_volume_concurrent_batching() {
    let backend = backend();
    let hook = Arc::new(
        LogStreamHook::builder("stress", "volume")
            .batch_interval(Duration::from_millis(5))
            .queue_capacity(128)
            .build(client(&backend))
            .unwrap(),
    );

    let threads: i64 = 8;
    let per_thread: i64 = 2_000;
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let hook = Arc::clone(&hook);
            thread::spawn(move || {
                for i in 0..per_thread {
                    let entry = LogEntry::new(LogLevel::Debug, "load")
                        .with_field("thread", t)
                        .with_field("seq", i);
                    hook.fire(&entry).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    hook.shutdown(Duration::from_secs(10)).unwrap();

    let total = (threads * per_thread) as u64;
    assert_eq!(backend.events("stress", "volume").len() as u64, total);
    assert_eq!(hook.metrics().events_fired(), total);
    assert_eq!(hook.metrics().events_delivered(), total);
    assert_eq!(hook.metrics().append_failures(), 0);
}

#[test]
fn test_fail_policy_rejects_when_full() {
    let backend = backend();
    let capacity = 4;
    let hook = stalled_hook(&backend, "fail", capacity, OverflowPolicy::Fail);

    let mut rejected = 0;
    for i in 0..capacity + 6 {
        match hook.fire(&LogEntry::new(LogLevel::Info, format!("m{}", i))) {
            Ok(()) => {}
            Err(HookError::QueueFull { max, .. }) => {
                assert_eq!(max, capacity);
                rejected += 1;
            }
            Err(e) => panic!("unexpected error {}", e),
        }
    }

    assert!(rejected >= 6, "only {} rejected", rejected);
    assert_eq!(hook.metrics().queue_full_events(), rejected);
    assert_eq!(hook.metrics().block_events(), 0);

    // everything accepted is still delivered
    backend.set_latency(Duration::ZERO);
    hook.shutdown(Duration::from_secs(5)).unwrap();
    let accepted = hook.metrics().events_fired() as usize;
    assert_eq!(backend.events("stress", "fail").len(), accepted);
}

#[test]
fn test_block_with_timeout_gives_up() {
    let backend = backend();
    let wait = Duration::from_millis(20);
    let hook = stalled_hook(
        &backend,
        "timeout",
        2,
        OverflowPolicy::BlockWithTimeout(wait),
    );

    hook.fire(&LogEntry::new(LogLevel::Info, "a")).unwrap();
    hook.fire(&LogEntry::new(LogLevel::Info, "b")).unwrap();

    let start = Instant::now();
    let err = hook
        .fire(&LogEntry::new(LogLevel::Info, "c"))
        .unwrap_err();
    assert!(matches!(err, HookError::QueueFull { current: 2, max: 2 }));
    assert!(start.elapsed() >= wait);
    assert_eq!(hook.metrics().block_events(), 1);
}

#[test]
fn test_block_policy_waits_for_room() {
    let backend = backend();
    let hook = Arc::new(stalled_hook(&backend, "block", 2, OverflowPolicy::Block));

    hook.fire(&LogEntry::new(LogLevel::Info, "a")).unwrap();
    hook.fire(&LogEntry::new(LogLevel::Info, "b")).unwrap();

    let done = Arc::new(AtomicUsize::new(0));
    let producer = {
        let hook = Arc::clone(&hook);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            hook.fire(&LogEntry::new(LogLevel::Info, "c")).unwrap();
            done.store(1, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert_eq!(done.load(Ordering::SeqCst), 0, "producer should be blocked");

    backend.set_latency(Duration::ZERO);
    producer.join().unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert!(hook.metrics().block_events() >= 1);

    hook.shutdown(Duration::from_secs(5)).unwrap();
    assert_eq!(backend.events("stress", "block").len(), 4);
}

#[test]
fn test_shutdown_drains_full_queue() {
    let backend = backend();
    let hook = LogStreamHook::builder("stress", "drain")
        .batch_interval(Duration::from_secs(60))
        .queue_capacity(1_000)
        .build(client(&backend))
        .unwrap();

    for i in 0..1_000 {
        hook.fire(&LogEntry::new(LogLevel::Info, format!("m{}", i)))
            .unwrap();
    }
    hook.shutdown(Duration::from_secs(5)).unwrap();

    assert_eq!(backend.events("stress", "drain").len(), 1_000);
    assert_eq!(backend.put_count(), 1);
}
