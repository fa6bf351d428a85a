//! # Dispatcher
//!
//! Transactional-outbox dispatch loop.
//!
//! Responsibilities:
//! - Acquire the fleet-wide dispatch lock before every cycle
//! - Fetch pending messages oldest-first and fan out to the broker
//! - Isolate per-message failures, keep retry bookkeeping
//! - Back off on lock contention instead of busy-spinning

pub mod backoff;
pub mod dispatcher;
pub mod lock;
pub mod metrics;
pub mod publishers;

pub use contracts::{
    BrokerPublisher, DeliveryReceipt, DispatcherConfig, LockCoordinator, MessageKind,
    MessageStatus, MessageStore, OutboxMessage,
};
pub use backoff::Backoff;
pub use dispatcher::DispatchLoop;
pub use lock::{InMemoryLockCoordinator, LeaseGuard};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use publishers::{LogPublisher, MockPublisher};
