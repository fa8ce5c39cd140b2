//! tillsync Binary Entry Point
//!
//! Runs the sales sync & reporting server. Core functionality is provided
//! by the `tillsync` library crate.

use clap::Parser;
use std::net::SocketAddr;
use tillsync::{
    config::AppConfig,
    server::{create_router, AppState},
    storage::StorageBuilder,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// tillsync - Sales Sync & Reporting Backend
#[derive(Parser, Debug)]
#[command(name = "tillsync", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "TILLSYNC_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "TILLSYNC_BIND")]
    bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "TILLSYNC_PORT")]
    port: Option<u16>,

    /// Database file path (overrides config file)
    #[arg(long, env = "TILLSYNC_DB_PATH")]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tillsync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(path) = cli.db_path {
        config.database.path = path;
    }
    config.validate()?;

    tracing::info!(
        "Server: {}:{}, Database: {}",
        config.server.bind,
        config.server.port,
        config.database.path,
    );

    // Build storage layer
    let handles = StorageBuilder::new(&config.database.path)
        .pool_size(config.database.pool_size)
        .build()
        .await?;
    tracing::info!("Storage initialized");

    if config.auth.require_admin {
        tracing::info!("Sync endpoint requires admin credentials (see the add-user binary)");
    } else {
        tracing::warn!("Sync endpoint is unauthenticated (auth.require_admin = false)");
    }

    // Create web server state
    let state = AppState {
        sales: handles.sales.clone(),
        users: handles.users.clone(),
        auth: config.auth.clone(),
    };

    // Build Axum router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down storage...");
    handles.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
