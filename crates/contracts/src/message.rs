//! Outbox message record - one row per logical message awaiting dispatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message kind, decides which publish path the dispatcher routes to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain publish
    #[default]
    Normal,
    /// Ordered publish keyed by sharding key
    Ordered,
    /// Delay already applied at original send time; replayed as a plain publish
    Delayed,
}

impl MessageKind {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Ordered => "ordered",
            Self::Delayed => "delayed",
        }
    }
}

/// Delivery status of an outbox row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum MessageStatus {
    /// Waiting for dispatch (0)
    #[default]
    Pending = 0,
    /// Delivered, broker id recorded (1)
    Sent = 1,
}

impl MessageStatus {
    /// Numeric status code as persisted by relational stores
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Receipt returned by the broker for one accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Broker-assigned message id; empty means the broker accepted nothing usable
    pub delivery_id: String,
}

impl DeliveryReceipt {
    /// Create a receipt with the given delivery id
    pub fn new(delivery_id: impl Into<String>) -> Self {
        Self {
            delivery_id: delivery_id.into(),
        }
    }
}

/// One row per logical message awaiting dispatch.
///
/// Created by the business transaction that needs guaranteed delivery,
/// mutated only by the dispatch loop, never deleted by this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Unique identifier, assigned at creation
    pub id: u64,
    /// Broker-assigned delivery id; `None` until a successful publish
    pub delivery_id: Option<String>,
    /// Destination topic
    pub topic: String,
    /// Broker tag / routing label
    pub tag: String,
    /// Business-defined key
    pub business_key: String,
    /// Message kind
    pub kind: MessageKind,
    /// Sharding key for ordered publish; falls back to `business_key` when unset
    pub sharding_key: Option<String>,
    /// Opaque serialized payload (broker-specific encoding)
    pub payload: String,
    /// Delivery status
    pub status: MessageStatus,
    /// Number of send attempts, success or failure
    pub attempt_count: u32,
    /// Timestamp of the most recent attempt
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl OutboxMessage {
    /// Create a new pending message with attempt count 0
    pub fn new(
        id: u64,
        topic: impl Into<String>,
        tag: impl Into<String>,
        business_key: impl Into<String>,
        kind: MessageKind,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id,
            delivery_id: None,
            topic: topic.into(),
            tag: tag.into(),
            business_key: business_key.into(),
            kind,
            sharding_key: None,
            payload: payload.into(),
            status: MessageStatus::Pending,
            attempt_count: 0,
            last_attempt_at: None,
            created_at: Utc::now(),
        }
    }

    /// Set the sharding key (builder-style)
    pub fn with_sharding_key(mut self, key: impl Into<String>) -> Self {
        self.sharding_key = Some(key.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }

    pub fn is_sent(&self) -> bool {
        self.status == MessageStatus::Sent
    }

    /// Sharding key used by the ordered publish path
    pub fn effective_sharding_key(&self) -> &str {
        self.sharding_key.as_deref().unwrap_or(&self.business_key)
    }

    /// Apply the bookkeeping for one dispatch attempt.
    ///
    /// Always increments the attempt count and stamps the attempt time.
    /// Only a receipt with a non-empty delivery id flips the status to
    /// `Sent`; a failed or empty-receipt attempt leaves the row pending.
    pub fn record_attempt(&mut self, receipt: Option<&DeliveryReceipt>) {
        self.attempt_count += 1;
        self.last_attempt_at = Some(Utc::now());

        if let Some(receipt) = receipt {
            if !receipt.delivery_id.is_empty() {
                self.delivery_id = Some(receipt.delivery_id.clone());
                self.status = MessageStatus::Sent;
            }
        }
    }
}
