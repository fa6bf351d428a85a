//! MessageStore trait - durable record of outbound messages
//!
//! Defines the abstract interface for persistence backends.

use crate::{OutboxError, OutboxMessage};

/// Message persistence trait
///
/// The store performs no claiming of its own: the lock coordinator is the
/// sole source of cross-instance exclusivity, so `fetch_pending` may assume
/// callers are already serialized.
#[trait_variant::make(MessageStore: Send)]
pub trait LocalMessageStore {
    /// Fetch up to `limit` pending messages, oldest first
    ///
    /// # Errors
    /// Returns a store error when the backend read fails
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<OutboxMessage>, OutboxError>;

    /// Persist all mutable fields of one message
    ///
    /// Must be idempotent under retry with the same values.
    async fn update(&self, message: &OutboxMessage) -> Result<(), OutboxError>;
}
