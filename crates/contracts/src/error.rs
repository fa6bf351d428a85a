//! Layered error definitions
//!
//! Categorized by source: config / lock / publish / store

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum OutboxError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Lock Errors =====
    /// Lock coordinator failure (not contention - contention is `Ok(None)`)
    #[error("lock error for resource '{resource}': {message}")]
    Lock { resource: String, message: String },

    // ===== Publish Errors =====
    /// Broker rejected or was unreachable for one message
    #[error("publish error for message {message_id}: {message}")]
    Publish { message_id: u64, message: String },

    // ===== Store Errors =====
    /// Message store read/write failure
    #[error("store error: {message}")]
    Store { message: String },

    /// Message not found in the store
    #[error("message not found: {message_id}")]
    MessageNotFound { message_id: u64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl OutboxError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create lock error
    pub fn lock(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lock {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create publish error
    pub fn publish(message_id: u64, message: impl Into<String>) -> Self {
        Self::Publish {
            message_id,
            message: message.into(),
        }
    }

    /// Create store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}
