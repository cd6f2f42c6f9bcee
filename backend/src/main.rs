//! Land Survey Platform - Backend Server

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use land_survey::{
    config::StorageBackend,
    create_app,
    store::{MemorySurveyStore, PgSurveyStore},
    AppState, Config, SurveyStore,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "land_survey=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Land Survey Server");
    tracing::info!("Environment: {}", config.environment);

    let store = connect_store(&config).await?;

    // Create application state
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("server.host and server.port do not form a socket address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn SurveyStore>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on shutdown");
            Ok(Arc::new(MemorySurveyStore::seeded().await))
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for postgres storage")?;

            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;

            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(Arc::new(PgSurveyStore::new(db_pool)))
        }
    }
}
