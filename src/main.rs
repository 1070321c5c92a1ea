//! Dry Beans API - Main entry point.
//!
//! Serves CRUD access to the dry beans dataset over HTTP, backed by
//! PostgreSQL or SQLite.

use clap::Parser;
use dry_beans_api::config::Config;
use dry_beans_api::db::{BeanStore, DbPool, bootstrap};
use dry_beans_api::routes::AppState;
use dry_beans_api::transport::HttpTransport;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!("Starting Dry Beans API v{}", env!("CARGO_PKG_VERSION"));

    let target = config.connection_target()?;
    let pool_options = config.pool_options()?;
    let pool = DbPool::connect(&target, &pool_options).await?;
    let store = BeanStore::new(pool, config.query_timeout_duration());

    if let Err(e) = bootstrap::bootstrap(&store, config.bootstrap_sql.as_deref()).await {
        error!(error = %e, "Failed to prepare database schema");
        store.close().await;
        return Err(e.into());
    }

    let transport = HttpTransport::new(AppState::new(store), &config.host, config.port)
        .with_static_dir(config.static_dir.clone());

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
