//! Dispatch metrics collection
//!
//! Prometheus-facing record functions plus an in-memory aggregator for
//! end-of-run summaries.

use std::time::Duration;

use contracts::MessageKind;
use metrics::{counter, gauge, histogram};

/// Record one message flipped to Sent
pub fn record_message_published(kind: MessageKind) {
    counter!(
        "outbox_messages_published_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record one failed publish attempt
pub fn record_publish_failure(kind: MessageKind) {
    counter!(
        "outbox_publish_failures_total",
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// Record one store fetch/update failure
pub fn record_store_failure() {
    counter!("outbox_store_failures_total").increment(1);
}

/// Record one cycle skipped because the lock was held elsewhere
pub fn record_lock_contention() {
    counter!("outbox_lock_contention_total").increment(1);
}

/// Record one completed dispatch cycle
pub fn record_cycle(batch_size: usize, duration: Duration) {
    counter!("outbox_dispatch_cycles_total").increment(1);
    gauge!("outbox_dispatch_last_batch_size").set(batch_size as f64);
    histogram!("outbox_dispatch_cycle_duration_ms").record(duration.as_secs_f64() * 1000.0);
}

/// Dispatch cycle aggregator
///
/// Aggregates metrics in memory for statistics and summary output.
#[derive(Debug, Clone, Default)]
pub struct CycleStatsAggregator {
    /// Total completed cycles
    pub total_cycles: u64,

    /// Total messages published
    pub total_published: u64,

    /// Total failed publish attempts
    pub total_publish_failures: u64,

    /// Total cycles lost to lock contention
    pub total_lock_contention: u64,

    /// Batch size statistics
    pub batch_stats: RunningStats,

    /// Cycle duration statistics (milliseconds)
    pub duration_stats: RunningStats,
}

impl CycleStatsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed cycle
    pub fn record_cycle(&mut self, batch_size: usize, published: u64, duration: Duration) {
        self.total_cycles += 1;
        self.total_published += published;
        self.batch_stats.push(batch_size as f64);
        self.duration_stats.push(duration.as_secs_f64() * 1000.0);
    }

    /// Record one failed publish attempt
    pub fn record_publish_failure(&mut self) {
        self.total_publish_failures += 1;
    }

    /// Record one contended lock acquisition
    pub fn record_lock_contention(&mut self) {
        self.total_lock_contention += 1;
    }

    /// Generate summary report
    pub fn summary(&self) -> DispatchSummary {
        let attempts = self.total_published + self.total_publish_failures;
        DispatchSummary {
            total_cycles: self.total_cycles,
            total_published: self.total_published,
            total_publish_failures: self.total_publish_failures,
            total_lock_contention: self.total_lock_contention,
            failure_rate: if attempts > 0 {
                self.total_publish_failures as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_stats),
            cycle_duration_ms: StatsSummary::from(&self.duration_stats),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Dispatch summary
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total_cycles: u64,
    pub total_published: u64,
    pub total_publish_failures: u64,
    pub total_lock_contention: u64,
    pub failure_rate: f64,
    pub batch_size: StatsSummary,
    pub cycle_duration_ms: StatsSummary,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total cycles: {}", self.total_cycles)?;
        writeln!(f, "Messages published: {}", self.total_published)?;
        writeln!(
            f,
            "Publish failures: {} ({:.2}%)",
            self.total_publish_failures, self.failure_rate
        )?;
        writeln!(f, "Lock contention: {}", self.total_lock_contention)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Cycle duration (ms): {}", self.cycle_duration_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Push a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}
