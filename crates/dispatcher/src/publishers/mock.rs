//! MockPublisher - scriptable broker stand-in for tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{BrokerPublisher, DeliveryReceipt, MessageKind, OutboxError, OutboxMessage};

/// One observed publish call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedCall {
    pub message_id: u64,
    pub kind: MessageKind,
    /// Set only for ordered publishes
    pub sharding_key: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    published: Vec<PublishedCall>,
    fail_ids: HashSet<u64>,
    empty_receipt_ids: HashSet<u64>,
}

/// Scriptable mock broker
///
/// Cheap to clone; all clones share state. Failure behavior is keyed by
/// message id so a single batch can mix outcomes.
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    state: Arc<Mutex<MockState>>,
    seq: Arc<AtomicU64>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish of this message id fail
    pub fn fail_for(&self, message_id: u64) {
        self.state.lock().unwrap().fail_ids.insert(message_id);
    }

    /// Stop failing this message id
    pub fn recover(&self, message_id: u64) {
        self.state.lock().unwrap().fail_ids.remove(&message_id);
    }

    /// Make publishes of this message id return an empty delivery id
    pub fn empty_receipt_for(&self, message_id: u64) {
        self.state
            .lock()
            .unwrap()
            .empty_receipt_ids
            .insert(message_id);
    }

    /// All successful publish calls, in completion order
    pub fn published(&self) -> Vec<PublishedCall> {
        self.state.lock().unwrap().published.clone()
    }

    pub fn publish_count(&self) -> usize {
        self.state.lock().unwrap().published.len()
    }

    fn record(&self, message: &OutboxMessage, sharding_key: Option<&str>) -> Result<DeliveryReceipt, OutboxError> {
        let mut state = self.state.lock().unwrap();

        if state.fail_ids.contains(&message.id) {
            return Err(OutboxError::publish(message.id, "broker unreachable (mock)"));
        }

        state.published.push(PublishedCall {
            message_id: message.id,
            kind: message.kind,
            sharding_key: sharding_key.map(str::to_string),
        });

        if state.empty_receipt_ids.contains(&message.id) {
            return Ok(DeliveryReceipt::new(""));
        }

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        Ok(DeliveryReceipt::new(format!("mock-{seq}")))
    }
}

impl BrokerPublisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(&self, message: &OutboxMessage) -> Result<DeliveryReceipt, OutboxError> {
        self.record(message, None)
    }

    async fn publish_ordered(
        &self,
        message: &OutboxMessage,
        sharding_key: &str,
    ) -> Result<DeliveryReceipt, OutboxError> {
        self.record(message, Some(sharding_key))
    }
}
