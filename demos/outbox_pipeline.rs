//! Outbox Pipeline Demo
//!
//! Demonstrates the full dispatch path with an in-memory store and the
//! tracing-backed LogPublisher. No broker or lock service required.
//!
//! Run with: cargo run --bin outbox_pipeline [config.toml]

use std::time::{Duration, Instant};

use config_loader::ConfigLoader;
use contracts::{DispatcherConfig, MessageKind, OutboxMessage};
use dispatcher::{DispatchLoop, InMemoryLockCoordinator, LogPublisher};
use message_store::InMemoryMessageStore;
use observability::{CycleStatsAggregator, LogFormat, ObservabilityConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (no Prometheus port for the demo)
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Pretty,
        metrics_port: None,
        default_log_level: "info".to_string(),
    })?;

    tracing::info!("Starting Outbox Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading dispatcher config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        DispatcherConfig {
            idle_delay_ms: 200,
            ..Default::default()
        }
    };

    // ==== Stage 2: Seed the outbox ====
    // In production these inserts happen inside the business transaction.
    let store = InMemoryMessageStore::new();
    for id in 1..=20u64 {
        let kind = match id % 3 {
            0 => MessageKind::Delayed,
            1 => MessageKind::Normal,
            _ => MessageKind::Ordered,
        };
        let mut message = OutboxMessage::new(
            id,
            "orders",
            "created",
            format!("order-{id}"),
            kind,
            format!(r#"{{"order_id":{id}}}"#),
        );
        if kind == MessageKind::Ordered {
            message = message.with_sharding_key(format!("shard-{}", id % 4));
        }
        store.insert(message).await?;
    }
    tracing::info!(pending = store.pending_count().await, "Outbox seeded");

    // ==== Stage 3: Start the dispatch loop ====
    let dispatch = DispatchLoop::new(
        config,
        store.clone(),
        InMemoryLockCoordinator::new(),
        LogPublisher::new("demo_broker"),
    );
    let metrics = dispatch.metrics();

    let shutdown = CancellationToken::new();
    let started = Instant::now();
    let task = dispatch.spawn(shutdown.clone());

    // ==== Stage 4: Wait for the outbox to drain ====
    while store.pending_count().await > 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    shutdown.cancel();
    task.await?;

    // ==== Stage 5: Report ====
    let snapshot = metrics.snapshot();
    let mut aggregator = CycleStatsAggregator::new();
    aggregator.record_cycle(
        snapshot.last_batch_size,
        snapshot.published_count,
        started.elapsed(),
    );
    println!("{}", aggregator.summary());

    tracing::info!(
        cycles = snapshot.cycle_count,
        published = snapshot.published_count,
        "Demo complete"
    );
    Ok(())
}
