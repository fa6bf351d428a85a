//! BrokerPublisher trait - dispatcher output interface
//!
//! Defines the abstract interface for broker clients.

use crate::{DeliveryReceipt, OutboxError, OutboxMessage};

/// Broker client trait
///
/// One call is one send attempt. No retry is performed inside the
/// publisher; retry is the dispatch loop's responsibility via re-fetch
/// on the next cycle.
#[trait_variant::make(BrokerPublisher: Send)]
pub trait LocalBrokerPublisher {
    /// Publisher name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Plain publish, used for normal and delayed kinds
    ///
    /// Delay semantics are resolved at original send time; replay does
    /// not re-apply delay.
    ///
    /// # Errors
    /// Returns a publish error when the broker is unreachable or rejects
    /// the message
    async fn publish(&self, message: &OutboxMessage) -> Result<DeliveryReceipt, OutboxError>;

    /// Ordered publish keyed by sharding key
    ///
    /// The broker routes messages sharing a key to the same partition,
    /// preserving their relative order.
    async fn publish_ordered(
        &self,
        message: &OutboxMessage,
        sharding_key: &str,
    ) -> Result<DeliveryReceipt, OutboxError>;
}
