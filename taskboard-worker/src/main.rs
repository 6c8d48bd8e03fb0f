//! # Taskboard Worker
//!
//! Runs the two halves of the board deletion cascade:
//!
//! - the outbox relay, which publishes `BoardDeleted` events the API left in
//!   the boards database
//! - the cascade consumer, which deletes the board's tasks from the tasks
//!   database as a member of the `delete-tasks-on-board-deletion` group
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-worker
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use taskboard_shared::{
    db::{
        migrations::{run_migrations, ServiceDatabase},
        pool::{create_pool, DatabaseConfig},
    },
    events::CASCADE_SUBSCRIBER,
    redis::{RedisClient, RedisConfig, RedisEventPublisher, RedisSubscription},
    services::{BoardDeletedHandler, CascadeNotifier},
    store::{PgBoardStore, PgTaskStore},
};
use taskboard_worker::{
    config::WorkerConfig,
    consumer::CascadeConsumer,
    relay::{OutboxRelay, RelayConfig},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pause after an empty fetch; the Redis read already blocked for `block_ms`
const CONSUMER_IDLE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_worker=debug,taskboard_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env().context("loading worker configuration")?;

    let boards_pool = create_pool(DatabaseConfig::new(config.boards_database_url.clone()))
        .await
        .context("connecting to the boards database")?;
    run_migrations(&boards_pool, ServiceDatabase::Boards).await?;

    let tasks_pool = create_pool(DatabaseConfig::new(config.tasks_database_url.clone()))
        .await
        .context("connecting to the tasks database")?;
    run_migrations(&tasks_pool, ServiceDatabase::Tasks).await?;

    let publisher_redis = RedisClient::new(RedisConfig::new(config.redis_url.clone()))
        .await
        .context("connecting to Redis for the relay")?;
    // Blocking XREADGROUP holds its own connection, apart from relay XADDs
    let subscriber_redis = RedisClient::new(RedisConfig::new(config.redis_url.clone()))
        .await
        .context("connecting to Redis for the consumer")?;

    let relay = OutboxRelay::new(
        CascadeNotifier::new(
            Arc::new(RedisEventPublisher::new(publisher_redis)),
            Arc::new(PgBoardStore::new(boards_pool)),
        ),
        RelayConfig {
            poll_interval: config.poll_interval(),
            max_backoff: config.max_backoff(),
            batch_size: config.batch_size as i64,
            lease_secs: config.lease_secs,
        },
    );

    let subscription = RedisSubscription::new(subscriber_redis, CASCADE_SUBSCRIBER, config.consumer_name.clone())
        .with_block_ms(config.block_ms);
    subscription.ensure_group().await?;

    let consumer = CascadeConsumer::new(
        Arc::new(subscription),
        BoardDeletedHandler::new(Arc::new(PgTaskStore::new(tasks_pool))),
        config.batch_size,
    );

    tracing::info!(consumer = %config.consumer_name, "Worker ready");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received, stopping..."),
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal, stopping"),
            }
            shutdown.cancel();
        }
    });

    tokio::join!(
        relay.run(shutdown.clone()),
        consumer.run(shutdown.clone(), CONSUMER_IDLE, config.max_backoff()),
    );

    tracing::info!("Worker stopped");
    Ok(())
}
