//! # Taskboard API Server
//!
//! Serves the user, board and task endpoints over HTTP.
//!
//! ## Architecture
//!
//! - One Postgres database per service (users, boards, tasks), migrated at startup
//! - Board deletions publish `BoardDeleted` to Redis Streams through an outbox
//! - Task routes ask for membership in-process, or over HTTP when
//!   `BOARD_SERVICE_URL` is set
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use taskboard_api::{
    app::{build_router, AppState},
    clients::HttpMembershipChecker,
    config::Config,
};
use taskboard_shared::{
    db::{
        migrations::{run_migrations, ServiceDatabase},
        pool::{create_pool, DatabaseConfig},
    },
    redis::{RedisClient, RedisConfig, RedisEventPublisher},
    services::{
        Authenticator, BoardRegistry, CascadeNotifier, InvitationWorkflow,
        LedgerMembershipChecker, MembershipChecker, MembershipLedger, TaskRegistry,
    },
    store::{PgBoardStore, PgTaskStore, PgUserStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let connect = |url: &str, database: ServiceDatabase| {
        let db_config =
            DatabaseConfig::new(url).with_max_connections(config.databases.max_connections);
        async move {
            let pool = create_pool(db_config)
                .await
                .with_context(|| format!("connecting to the {} database", database.name()))?;
            run_migrations(&pool, database).await?;
            anyhow::Ok(pool)
        }
    };

    let users_pool = connect(&config.databases.users, ServiceDatabase::Users).await?;
    let boards_pool = connect(&config.databases.boards, ServiceDatabase::Boards).await?;
    let tasks_pool = connect(&config.databases.tasks, ServiceDatabase::Tasks).await?;

    let redis = RedisClient::new(RedisConfig::new(config.redis_url.clone()))
        .await
        .context("connecting to Redis")?;

    let board_store = Arc::new(PgBoardStore::new(boards_pool));
    let ledger = MembershipLedger::new(board_store.clone());
    let notifier = CascadeNotifier::new(
        Arc::new(RedisEventPublisher::new(redis)),
        board_store.clone(),
    );

    let checker: Arc<dyn MembershipChecker> = match &config.board_service_url {
        Some(url) => {
            tracing::info!(board_service = %url, "Task routes use the remote membership checker");
            Arc::new(HttpMembershipChecker::new(url.clone())?)
        }
        None => Arc::new(LedgerMembershipChecker::new(ledger.clone())),
    };

    let state = AppState::new(
        Authenticator::new(
            Arc::new(PgUserStore::new(users_pool)),
            config.jwt.secret.clone(),
        ),
        BoardRegistry::new(board_store.clone(), notifier),
        ledger,
        InvitationWorkflow::new(board_store),
        TaskRegistry::new(Arc::new(PgTaskStore::new(tasks_pool)), checker),
        config.api.clone(),
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
