//! Hook metrics for observability
//!
//! Counters shared between the producer side of a hook and its flush worker.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for hook observability
///
/// # Example
///
/// ```
/// use logstream_hook::HookMetrics;
///
/// let metrics = HookMetrics::new();
///
/// metrics.record_fired();
/// metrics.record_delivered(1);
///
/// assert_eq!(metrics.events_fired(), 1);
/// assert_eq!(metrics.events_delivered(), 1);
/// ```
#[derive(Debug)]
pub struct HookMetrics {
    /// Entries accepted by `fire` (queued or sent)
    events_fired: AtomicU64,

    /// Events acknowledged by the backend
    events_delivered: AtomicU64,

    /// Append requests issued to the backend
    append_calls: AtomicU64,

    /// Append requests the backend rejected
    append_failures: AtomicU64,

    /// Pending flush failures evicted before any producer saw them
    failures_overwritten: AtomicU64,

    /// Number of times the batching queue was full
    queue_full_events: AtomicU64,

    /// Number of times a producer waited for queue space
    block_events: AtomicU64,
}

impl HookMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            events_fired: AtomicU64::new(0),
            events_delivered: AtomicU64::new(0),
            append_calls: AtomicU64::new(0),
            append_failures: AtomicU64::new(0),
            failures_overwritten: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn events_fired(&self) -> u64 {
        self.events_fired.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_delivered(&self) -> u64 {
        self.events_delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn append_calls(&self) -> u64 {
        self.append_calls.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn append_failures(&self) -> u64 {
        self.append_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failures_overwritten(&self) -> u64 {
        self.failures_overwritten.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_fired(&self) -> u64 {
        self.events_fired.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered(&self, count: usize) -> u64 {
        self.events_delivered.fetch_add(count as u64, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_append(&self) -> u64 {
        self.append_calls.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_append_failure(&self) -> u64 {
        self.append_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failure_overwritten(&self) -> u64 {
        self.failures_overwritten.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    /// Events accepted by `fire` but not yet acknowledged by the backend
    pub fn pending(&self) -> u64 {
        self.events_fired().saturating_sub(self.events_delivered())
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.events_fired.store(0, Ordering::Relaxed);
        self.events_delivered.store(0, Ordering::Relaxed);
        self.append_calls.store(0, Ordering::Relaxed);
        self.append_failures.store(0, Ordering::Relaxed);
        self.failures_overwritten.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
    }
}

impl Default for HookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HookMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            events_fired: AtomicU64::new(self.events_fired()),
            events_delivered: AtomicU64::new(self.events_delivered()),
            append_calls: AtomicU64::new(self.append_calls()),
            append_failures: AtomicU64::new(self.append_failures()),
            failures_overwritten: AtomicU64::new(self.failures_overwritten()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = HookMetrics::new();
        assert_eq!(metrics.events_fired(), 0);
        assert_eq!(metrics.events_delivered(), 0);
        assert_eq!(metrics.append_calls(), 0);
        assert_eq!(metrics.failures_overwritten(), 0);
        assert_eq!(metrics.queue_full_events(), 0);
    }

    #[test]
    fn test_metrics_pending() {
        let metrics = HookMetrics::new();
        for _ in 0..5 {
            metrics.record_fired();
        }
        metrics.record_delivered(3);
        assert_eq!(metrics.pending(), 2);
    }

    #[test]
    fn test_metrics_reset() {
        let metrics = HookMetrics::new();
        metrics.record_fired();
        metrics.record_append_failure();
        metrics.record_queue_full();

        metrics.reset();

        assert_eq!(metrics.events_fired(), 0);
        assert_eq!(metrics.append_failures(), 0);
        assert_eq!(metrics.queue_full_events(), 0);
    }

    #[test]
    fn test_metrics_clone_is_snapshot() {
        let metrics = HookMetrics::new();
        metrics.record_append();

        let snapshot = metrics.clone();
        metrics.record_append();

        assert_eq!(metrics.append_calls(), 2);
        assert_eq!(snapshot.append_calls(), 1);
    }
}
