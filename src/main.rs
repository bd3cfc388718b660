//! Catalog Server - library catalog REST API
//!
//! Loads configuration, sets up logging, connects the storage and session
//! backends and serves the API.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use catalog_server::{
    api,
    config::{AppConfig, LoggingConfig, SessionBackend, StorageBackend},
    repository::{MemoryStore, Repository},
    services::{
        redis::RedisService,
        sessions::{MemorySessionStore, SessionStore},
        Services,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Catalog Server v{}", env!("CARGO_PKG_VERSION"));

    let repository = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Database migrations completed");
            Repository::new(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Repository::in_memory(MemoryStore::new())
        }
    };

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            let redis = RedisService::new(&config.redis.url, config.session.ttl_seconds)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis");
            Arc::new(redis)
        }
        SessionBackend::Memory => Arc::new(MemorySessionStore::new(config.session.ttl_seconds)),
    };

    let services = Services::new(repository, config.auth.clone(), sessions);

    if let Some(bootstrap) = &config.auth.bootstrap_admin {
        services
            .auth
            .ensure_bootstrap_user(bootstrap)
            .await
            .context("Failed to create bootstrap account")?;
    }

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Console logging in the configured format, plus daily files when a directory is set
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("catalog_server={},tower_http=debug", logging.level).into());

    let console = if logging.format == "json" {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let (file, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "catalog-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    guard
}
