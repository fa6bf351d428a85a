//! Dispatcher configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Lock resource name used by the fleet to serialize dispatch cycles
pub const DEFAULT_LOCK_RESOURCE: &str = "transaction_message";

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherConfig {
    /// Named lock resource contended across instances
    #[serde(default = "default_lock_resource")]
    pub lock_resource: String,

    /// Lock lease duration in milliseconds; must cover one full cycle
    #[serde(default = "default_lease_ms")]
    #[validate(range(min = 1))]
    pub lease_ms: u64,

    /// Maximum pending messages fetched per cycle
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1))]
    pub batch_size: usize,

    /// Concurrent publish workers; defaults to host available parallelism
    pub worker_parallelism: Option<usize>,

    /// Idle delay in milliseconds when a cycle found nothing to dispatch
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,

    /// Backoff applied between failed lock acquisitions
    #[serde(default)]
    #[validate(nested)]
    pub backoff: BackoffConfig,
}

fn default_lock_resource() -> String {
    DEFAULT_LOCK_RESOURCE.to_string()
}

fn default_lease_ms() -> u64 {
    60_000
}

fn default_batch_size() -> usize {
    100
}

fn default_idle_delay_ms() -> u64 {
    1_000
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            lock_resource: default_lock_resource(),
            lease_ms: default_lease_ms(),
            batch_size: default_batch_size(),
            worker_parallelism: None,
            idle_delay_ms: default_idle_delay_ms(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Capped exponential backoff configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct BackoffConfig {
    /// Initial delay in milliseconds
    #[validate(range(min = 1))]
    pub initial_ms: u64,
    /// Delay ceiling in milliseconds
    pub max_ms: u64,
    /// Growth factor per failed attempt
    #[validate(range(min = 1.0))]
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 200,
            max_ms: 5_000,
            multiplier: 2.0,
        }
    }
}
