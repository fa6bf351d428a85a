//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for one dispatch loop
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Completed dispatch cycles
    cycle_count: AtomicU64,
    /// Messages flipped to Sent
    published_count: AtomicU64,
    /// Publish attempts that failed
    publish_failure_count: AtomicU64,
    /// Store fetch/update failures
    store_failure_count: AtomicU64,
    /// Cycles skipped because the lock was held elsewhere
    lock_contention_count: AtomicU64,
    /// Size of the most recent fetched batch
    last_batch_size: AtomicUsize,
    /// Workers currently dispatching
    inflight: AtomicUsize,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count.load(Ordering::Relaxed)
    }

    pub fn inc_cycle_count(&self) {
        self.cycle_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn published_count(&self) -> u64 {
        self.published_count.load(Ordering::Relaxed)
    }

    pub fn inc_published_count(&self) {
        self.published_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn publish_failure_count(&self) -> u64 {
        self.publish_failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_publish_failure_count(&self) {
        self.publish_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_failure_count(&self) -> u64 {
        self.store_failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_store_failure_count(&self) {
        self.store_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn lock_contention_count(&self) -> u64 {
        self.lock_contention_count.load(Ordering::Relaxed)
    }

    pub fn inc_lock_contention_count(&self) {
        self.lock_contention_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_batch_size(&self) -> usize {
        self.last_batch_size.load(Ordering::Relaxed)
    }

    pub fn set_last_batch_size(&self, size: usize) {
        self.last_batch_size.store(size, Ordering::Relaxed);
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Relaxed)
    }

    pub fn inc_inflight(&self) {
        self.inflight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_inflight(&self) {
        self.inflight.fetch_sub(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycle_count: self.cycle_count(),
            published_count: self.published_count(),
            publish_failure_count: self.publish_failure_count(),
            store_failure_count: self.store_failure_count(),
            lock_contention_count: self.lock_contention_count(),
            last_batch_size: self.last_batch_size(),
            inflight: self.inflight(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub cycle_count: u64,
    pub published_count: u64,
    pub publish_failure_count: u64,
    pub store_failure_count: u64,
    pub lock_contention_count: u64,
    pub last_batch_size: usize,
    pub inflight: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = DispatchMetrics::new();
        metrics.inc_cycle_count();
        metrics.inc_published_count();
        metrics.inc_published_count();
        metrics.inc_lock_contention_count();
        metrics.set_last_batch_size(42);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycle_count, 1);
        assert_eq!(snapshot.published_count, 2);
        assert_eq!(snapshot.publish_failure_count, 0);
        assert_eq!(snapshot.lock_contention_count, 1);
        assert_eq!(snapshot.last_batch_size, 42);
        assert_eq!(snapshot.inflight, 0);
    }

    #[test]
    fn test_inflight_tracks_workers() {
        let metrics = DispatchMetrics::new();
        metrics.inc_inflight();
        metrics.inc_inflight();
        assert_eq!(metrics.inflight(), 2);
        metrics.dec_inflight();
        assert_eq!(metrics.inflight(), 1);
    }
}
