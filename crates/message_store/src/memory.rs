//! In-memory message store backed by a `tokio::sync::Mutex<HashMap>`

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use contracts::{MessageStore, OutboxError, OutboxMessage};

/// In-memory message store
///
/// Cheap to clone; all clones share the same rows. Rows are never deleted
/// here - retention is an external concern.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    rows: Arc<Mutex<HashMap<u64, OutboxMessage>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly created message
    ///
    /// Called by the business transaction that needs guaranteed delivery.
    ///
    /// # Errors
    /// Returns a store error when the id is already taken
    pub async fn insert(&self, message: OutboxMessage) -> Result<(), OutboxError> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&message.id) {
            return Err(OutboxError::store(format!(
                "duplicate message id: {}",
                message.id
            )));
        }
        debug!(message_id = message.id, topic = %message.topic, "Message inserted");
        rows.insert(message.id, message);
        Ok(())
    }

    /// Look up one message by id
    pub async fn get(&self, id: u64) -> Option<OutboxMessage> {
        self.rows.lock().await.get(&id).cloned()
    }

    /// Number of pending rows
    pub async fn pending_count(&self) -> usize {
        self.rows
            .lock()
            .await
            .values()
            .filter(|m| m.is_pending())
            .count()
    }

    /// Total number of rows
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

impl MessageStore for InMemoryMessageStore {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxMessage>, OutboxError> {
        let rows = self.rows.lock().await;
        let mut pending: Vec<OutboxMessage> =
            rows.values().filter(|m| m.is_pending()).cloned().collect();

        // Oldest first; id breaks creation-time ties deterministically
        pending.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        pending.truncate(limit);
        Ok(pending)
    }

    async fn update(&self, message: &OutboxMessage) -> Result<(), OutboxError> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&message.id) {
            Some(row) => {
                *row = message.clone();
                Ok(())
            }
            None => Err(OutboxError::MessageNotFound {
                message_id: message.id,
            }),
        }
    }
}
