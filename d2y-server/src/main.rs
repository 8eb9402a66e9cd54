//! D2Y Order Server
//!
//! Order lifecycle service for a delivery / click-and-collect marketplace:
//! order placement against slot capacity, payment and fulfilment status,
//! refunds, and a live WebSocket channel.

mod api;
mod config;
mod credentials;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, DatabaseLimits, get_database_url};
use credentials::CredentialStore;
use d2y_core::events::FanoutHub;
use d2y_core::lifecycle::OrderEngine;
use d2y_core::store::{MemoryStore, OrderStore, PgStore};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// D2Y - marketplace order lifecycle server
#[derive(Parser, Debug)]
#[command(name = "d2y-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./d2y-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,

    /// Serve from an in-process store seeded from the config file
    #[arg(long, default_value = "false", conflicts_with = "migrate")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting d2y-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.listen;
    let limits = loaded_config.database;
    tracing::info!(
        credentials = loaded_config.credentials.count(),
        "Configuration loaded from {:?}",
        args.config
    );

    let (store, db_pool): (Arc<dyn OrderStore>, Option<PgPool>) = if args.memory {
        tracing::warn!("Running against the in-memory store; nothing is persisted");
        let store = MemoryStore::seeded(loaded_config.seed, limits.statement_timeout);
        (Arc::new(store) as Arc<dyn OrderStore>, None)
    } else {
        let pool = connect(&limits).await?;
        if args.migrate {
            tracing::info!("Running database migrations...");
            sqlx::migrate!("../migrations")
                .run(&pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to run migrations: {}", e);
                    e
                })?;
            tracing::info!("Migrations completed successfully");
        }
        (
            Arc::new(PgStore::new(pool.clone())) as Arc<dyn OrderStore>,
            Some(pool),
        )
    };

    // Create application state
    let engine = OrderEngine::new(store, FanoutHub::new(), loaded_config.orders);
    let identities = Arc::new(CredentialStore::new(loaded_config.credentials));
    let state = AppState::new(engine, identities);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader)?;

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();

    if let Some(pool) = db_pool {
        tracing::info!("Closing database connections...");
        pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Connect to PostgreSQL with bounded acquire and statement times.
async fn connect(limits: &DatabaseLimits) -> anyhow::Result<PgPool> {
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    let statement_timeout = limits.statement_timeout.as_millis().to_string();
    let options = PgConnectOptions::from_str(&database_url)?
        .options([("statement_timeout", statement_timeout.as_str())]);

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(limits.max_connections)
        .acquire_timeout(limits.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");
    Ok(pool)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
