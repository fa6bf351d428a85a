//! DispatchLoop - lock-guarded polling loop with concurrent fan-out

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    BrokerPublisher, DispatcherConfig, LockCoordinator, MessageKind, MessageStore, OutboxMessage,
};

use crate::backoff::Backoff;
use crate::metrics::DispatchMetrics;

/// The dispatch loop: repeatedly acquires the fleet-wide lock, fetches a
/// batch of pending messages and fans them out to the broker.
///
/// Collaborators are injected at construction; the loop owns no global
/// state. It never terminates on its own due to dispatch errors - only
/// the cancellation token stops it.
pub struct DispatchLoop<S, L, P> {
    config: DispatcherConfig,
    store: Arc<S>,
    lock: L,
    publisher: Arc<P>,
    metrics: Arc<DispatchMetrics>,
    workers: Arc<Semaphore>,
}

impl<S, L, P> DispatchLoop<S, L, P>
where
    S: MessageStore + Send + Sync + 'static,
    L: LockCoordinator + Sync + 'static,
    L::Guard: 'static,
    P: BrokerPublisher + Send + Sync + 'static,
{
    /// Create a dispatch loop with injected collaborators
    pub fn new(config: DispatcherConfig, store: S, lock: L, publisher: P) -> Self {
        let parallelism = config.worker_parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        });

        Self {
            config,
            store: Arc::new(store),
            lock,
            publisher: Arc::new(publisher),
            metrics: Arc::new(DispatchMetrics::new()),
            workers: Arc::new(Semaphore::new(parallelism)),
        }
    }

    /// Shared metrics handle, valid after the loop is consumed by `run`
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the dispatch loop until the token is cancelled
    #[instrument(name = "dispatch_loop_run", skip(self, shutdown), fields(resource = %self.config.lock_resource))]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            resource = %self.config.lock_resource,
            lease_ms = self.config.lease_ms,
            batch_size = self.config.batch_size,
            workers = self.workers.available_permits(),
            "Dispatch loop started"
        );

        let lease = Duration::from_millis(self.config.lease_ms);
        let idle_delay = Duration::from_millis(self.config.idle_delay_ms);
        let mut backoff = Backoff::new(self.config.backoff);

        while !shutdown.is_cancelled() {
            match self.lock.try_acquire(&self.config.lock_resource, lease).await {
                Ok(Some(guard)) => {
                    backoff.reset();
                    let dispatched = self.run_cycle().await;
                    drop(guard);

                    if dispatched == 0 && !self.pause(idle_delay, &shutdown).await {
                        break;
                    }
                }
                Ok(None) => {
                    warn!(resource = %self.config.lock_resource, "Failed to acquire dispatch lock");
                    self.metrics.inc_lock_contention_count();
                    observability::record_lock_contention();
                    if !self.pause(backoff.next_delay(), &shutdown).await {
                        break;
                    }
                }
                Err(e) => {
                    error!(
                        resource = %self.config.lock_resource,
                        error = %e,
                        "Lock coordinator error"
                    );
                    if !self.pause(backoff.next_delay(), &shutdown).await {
                        break;
                    }
                }
            }
        }

        info!(
            cycles = self.metrics.cycle_count(),
            published = self.metrics.published_count(),
            "Dispatch loop stopped"
        );
    }

    /// Spawn the dispatch loop as a background task
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    /// One dispatch cycle under the lock; returns the batch size
    ///
    /// All workers are joined before the cycle completes, so the lease
    /// covers every bookkeeping write of this batch.
    async fn run_cycle(&self) -> usize {
        let started = Instant::now();
        let batch = match self.store.fetch_pending(self.config.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "Failed to fetch pending messages");
                self.metrics.inc_store_failure_count();
                observability::record_store_failure();
                return 0;
            }
        };

        self.metrics.set_last_batch_size(batch.len());
        if batch.is_empty() {
            self.metrics.inc_cycle_count();
            observability::record_cycle(0, started.elapsed());
            return 0;
        }

        debug!(batch = batch.len(), "Dispatch cycle started");
        let batch_size = batch.len();

        let mut tasks = JoinSet::new();
        for message in batch {
            // The worker semaphore is never closed, so acquire cannot
            // fail today; abandon the rest of the batch if that changes
            let permit = match Arc::clone(&self.workers).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let store = Arc::clone(&self.store);
            let publisher = Arc::clone(&self.publisher);
            let metrics = Arc::clone(&self.metrics);

            tasks.spawn(async move {
                let _permit = permit;
                metrics.inc_inflight();
                dispatch_one(message, publisher, store, Arc::clone(&metrics)).await;
                metrics.dec_inflight();
            });
        }

        while tasks.join_next().await.is_some() {}

        self.metrics.inc_cycle_count();
        observability::record_cycle(batch_size, started.elapsed());
        debug!(batch = batch_size, "Dispatch cycle complete");
        batch_size
    }

    /// Sleep unless cancelled; false means shutdown was requested
    async fn pause(&self, delay: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }
}

/// Dispatch one message and persist the attempt bookkeeping.
///
/// Fully isolated: a publish or store failure here never affects sibling
/// messages in the same batch.
async fn dispatch_one<S, P>(
    mut message: OutboxMessage,
    publisher: Arc<P>,
    store: Arc<S>,
    metrics: Arc<DispatchMetrics>,
) where
    S: MessageStore + Send + Sync,
    P: BrokerPublisher + Send + Sync,
{
    let result = match message.kind {
        MessageKind::Normal | MessageKind::Delayed => publisher.publish(&message).await,
        MessageKind::Ordered => {
            publisher
                .publish_ordered(&message, message.effective_sharding_key())
                .await
        }
    };

    let receipt = match result {
        Ok(receipt) => Some(receipt),
        Err(e) => {
            error!(message_id = message.id, error = %e, "Message publish failed");
            metrics.inc_publish_failure_count();
            observability::record_publish_failure(message.kind);
            None
        }
    };

    // Attempt count and timestamp advance on every attempt, success or not
    message.record_attempt(receipt.as_ref());
    if message.is_sent() {
        metrics.inc_published_count();
        observability::record_message_published(message.kind);
    }

    if let Err(e) = store.update(&message).await {
        // The unpersisted attempt will be re-fetched and re-sent next
        // cycle; at-least-once delivery holds, duplicates are possible.
        error!(
            message_id = message.id,
            error = %e,
            "Failed to persist attempt bookkeeping"
        );
        metrics.inc_store_failure_count();
        observability::record_store_failure();
    }
}
