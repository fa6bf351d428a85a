//! Flaky Broker Demo
//!
//! Shows retry bookkeeping under broker failures: one message keeps
//! failing while its siblings drain, then the broker "recovers" and the
//! stuck message goes out on a later cycle.
//!
//! Run with: cargo run --bin flaky_broker

use std::time::Duration;

use contracts::{BackoffConfig, DispatcherConfig, MessageKind, OutboxMessage};
use dispatcher::{DispatchLoop, InMemoryLockCoordinator, MockPublisher};
use message_store::InMemoryMessageStore;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let store = InMemoryMessageStore::new();
    for id in 1..=5u64 {
        store
            .insert(OutboxMessage::new(
                id,
                "payments",
                "captured",
                format!("payment-{id}"),
                MessageKind::Normal,
                format!(r#"{{"payment_id":{id}}}"#),
            ))
            .await?;
    }

    let publisher = MockPublisher::new();
    publisher.fail_for(3);
    tracing::info!("Broker rejects message 3 until further notice");

    let config = DispatcherConfig {
        idle_delay_ms: 100,
        backoff: BackoffConfig {
            initial_ms: 50,
            max_ms: 500,
            multiplier: 2.0,
        },
        ..Default::default()
    };
    let dispatch = DispatchLoop::new(
        config,
        store.clone(),
        InMemoryLockCoordinator::new(),
        publisher.clone(),
    );

    let shutdown = CancellationToken::new();
    let task = dispatch.spawn(shutdown.clone());

    // Let the healthy messages drain and the poison message accumulate attempts
    while store.pending_count().await > 1 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let stuck = store.get(3).await.expect("message 3 exists");
    tracing::info!(
        attempts = stuck.attempt_count,
        "Message 3 still pending while siblings are sent"
    );

    tracing::info!("Broker recovered");
    publisher.recover(3);

    while store.pending_count().await > 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    shutdown.cancel();
    task.await?;

    let delivered = store.get(3).await.expect("message 3 exists");
    tracing::info!(
        attempts = delivered.attempt_count,
        delivery_id = ?delivered.delivery_id,
        "Message 3 delivered after recovery"
    );
    Ok(())
}
