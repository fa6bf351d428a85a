//! LockCoordinator trait - named, leased mutual exclusion
//!
//! Provides at-most-one-active-dispatcher semantics across the fleet.

use std::time::Duration;

use crate::OutboxError;

/// Distributed lock trait
///
/// Acquisition is modeled as an RAII guard: `Some(guard)` means the lease
/// was granted, and the lease is released when the guard drops or the lease
/// duration expires, whichever comes first. After expiry the coordinator is
/// responsible for fencing, not the caller.
#[trait_variant::make(LockCoordinator: Send)]
pub trait LocalLockCoordinator {
    /// Guard held for the duration of the critical section
    type Guard: Send;

    /// Try to acquire a lease on the named resource
    ///
    /// Returns `Ok(None)` when another holder owns an unexpired lease
    /// (contention, not an error).
    ///
    /// # Errors
    /// Returns a lock error when the coordinator backend itself fails
    async fn try_acquire(
        &self,
        resource: &str,
        lease: Duration,
    ) -> Result<Option<Self::Guard>, OutboxError>;
}
