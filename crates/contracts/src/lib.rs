//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Collaborator Model
//! - `MessageStore` persists outbox rows; the dispatcher never claims rows itself
//! - `LockCoordinator` is the sole source of cross-instance exclusivity
//! - `BrokerPublisher` performs one send attempt per call, no internal retry

mod dispatcher_config;
mod error;
mod lock;
mod message;
mod publisher;
mod store;

pub use dispatcher_config::*;
pub use error::*;
pub use lock::*;
pub use message::*;
pub use publisher::*;
pub use store::*;
