//! LogPublisher - logs each publish via tracing

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{BrokerPublisher, DeliveryReceipt, OutboxError, OutboxMessage};
use tracing::{info, instrument};

/// Publisher that logs message summaries and always succeeds
///
/// Useful for demos and wiring checks; the delivery id is generated
/// locally as `{name}-{seq}`.
pub struct LogPublisher {
    name: String,
    seq: AtomicU64,
}

impl LogPublisher {
    /// Create a new LogPublisher with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seq: AtomicU64::new(0),
        }
    }

    fn next_receipt(&self) -> DeliveryReceipt {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        DeliveryReceipt::new(format!("{}-{}", self.name, seq))
    }
}

impl BrokerPublisher for LogPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_publisher_publish",
        skip(self, message),
        fields(publisher = %self.name, message_id = message.id)
    )]
    async fn publish(&self, message: &OutboxMessage) -> Result<DeliveryReceipt, OutboxError> {
        let receipt = self.next_receipt();
        info!(
            publisher = %self.name,
            message_id = message.id,
            topic = %message.topic,
            tag = %message.tag,
            kind = message.kind.as_str(),
            delivery_id = %receipt.delivery_id,
            "Message published"
        );
        Ok(receipt)
    }

    #[instrument(
        name = "log_publisher_publish_ordered",
        skip(self, message),
        fields(publisher = %self.name, message_id = message.id)
    )]
    async fn publish_ordered(
        &self,
        message: &OutboxMessage,
        sharding_key: &str,
    ) -> Result<DeliveryReceipt, OutboxError> {
        let receipt = self.next_receipt();
        info!(
            publisher = %self.name,
            message_id = message.id,
            topic = %message.topic,
            sharding_key,
            delivery_id = %receipt.delivery_id,
            "Ordered message published"
        );
        Ok(receipt)
    }
}
