//! Configuration validation
//!
//! Validation rules:
//! - field-level bounds via the `Validate` derive on `DispatcherConfig`
//! - lock_resource non-empty
//! - backoff.max_ms >= backoff.initial_ms
//! - worker_parallelism > 0 when set

use contracts::{DispatcherConfig, OutboxError};
use validator::Validate;

/// Validate a DispatcherConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DispatcherConfig) -> Result<(), OutboxError> {
    validate_derived_bounds(config)?;
    validate_lock_resource(config)?;
    validate_backoff(config)?;
    validate_parallelism(config)?;
    Ok(())
}

/// Field-level range checks from the derive
fn validate_derived_bounds(config: &DispatcherConfig) -> Result<(), OutboxError> {
    config.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        OutboxError::config_validation(field, errors.to_string())
    })
}

/// The lock resource names the fleet-wide critical section; empty would
/// collide with nothing and break mutual exclusion
fn validate_lock_resource(config: &DispatcherConfig) -> Result<(), OutboxError> {
    if config.lock_resource.trim().is_empty() {
        return Err(OutboxError::config_validation(
            "lock_resource",
            "must not be empty",
        ));
    }
    Ok(())
}

/// Backoff ceiling must not undercut the initial delay
fn validate_backoff(config: &DispatcherConfig) -> Result<(), OutboxError> {
    if config.backoff.max_ms < config.backoff.initial_ms {
        return Err(OutboxError::config_validation(
            "backoff.max_ms",
            format!(
                "must be >= initial_ms ({} < {})",
                config.backoff.max_ms, config.backoff.initial_ms
            ),
        ));
    }
    Ok(())
}

fn validate_parallelism(config: &DispatcherConfig) -> Result<(), OutboxError> {
    if config.worker_parallelism == Some(0) {
        return Err(OutboxError::config_validation(
            "worker_parallelism",
            "must be > 0 when set",
        ));
    }
    Ok(())
}
