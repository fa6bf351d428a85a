//! In-memory lease-based lock coordinator
//!
//! Process-local implementation of the `LockCoordinator` contract. All
//! clones share the same lease table, so two dispatch loops handed the
//! same coordinator contend exactly like two fleet instances against a
//! distributed lock service. Production deployments back the trait with
//! Redis, etcd leases, Postgres advisory locks, etc.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use contracts::{LockCoordinator, OutboxError};

#[derive(Debug)]
struct Lease {
    holder: u64,
    expires_at: Instant,
}

type LeaseTable = Arc<Mutex<HashMap<String, Lease>>>;

/// In-memory lock coordinator
#[derive(Debug, Clone, Default)]
pub struct InMemoryLockCoordinator {
    leases: LeaseTable,
    next_holder: Arc<AtomicU64>,
}

impl InMemoryLockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockCoordinator for InMemoryLockCoordinator {
    type Guard = LeaseGuard;

    async fn try_acquire(
        &self,
        resource: &str,
        lease: Duration,
    ) -> Result<Option<LeaseGuard>, OutboxError> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|e| OutboxError::lock(resource, format!("lease table poisoned: {e}")))?;

        let now = Instant::now();
        if let Some(existing) = leases.get(resource) {
            if existing.expires_at > now {
                return Ok(None);
            }
            // Expired lease: steal it. Fencing the stale holder is the
            // coordinator's job, not the dispatcher's.
            debug!(resource, stale_holder = existing.holder, "Expired lease stolen");
        }

        let holder = self.next_holder.fetch_add(1, Ordering::Relaxed);
        leases.insert(
            resource.to_string(),
            Lease {
                holder,
                expires_at: now + lease,
            },
        );

        Ok(Some(LeaseGuard {
            leases: Arc::clone(&self.leases),
            resource: resource.to_string(),
            holder,
        }))
    }
}

/// Releases the lease on drop, unless it already expired and was stolen
#[derive(Debug)]
pub struct LeaseGuard {
    leases: LeaseTable,
    resource: String,
    holder: u64,
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if let Ok(mut leases) = self.leases.lock() {
            if let Some(lease) = leases.get(&self.resource) {
                if lease.holder == self.holder {
                    leases.remove(&self.resource);
                }
            }
        }
    }
}
