//! Built-in publishers: tracing-backed and mock

mod log;
mod mock;

pub use log::LogPublisher;
pub use mock::MockPublisher;
