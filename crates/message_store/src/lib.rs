//! # Message Store
//!
//! In-memory `MessageStore` backend.
//!
//! Responsibilities:
//! - Keep outbox rows addressable by id
//! - Serve age-ordered pending batches
//! - Apply idempotent full-row updates
//!
//! Production deployments back the same trait with a relational table
//! (indexed on status + creation time); this backend is the reference
//! semantics used by demos and tests.

mod memory;

pub use contracts::{MessageStore, OutboxMessage};
pub use memory::InMemoryMessageStore;
