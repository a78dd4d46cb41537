use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dify_admin_api::database::{manager, PgStore, RetryPolicy};
use dify_admin_api::{router, AppConfig, AppState};

#[derive(Debug, Parser)]
#[command(name = "dify-admin-api", version, about = "Admin API for accounts, tenants and datasets")]
struct Args {
    /// Configuration file; defaults to config.yaml next to the executable
    #[arg(short, long, env = "DIFY_ADMIN_CONFIG")]
    config: Option<PathBuf>,

    /// Override server.port from the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_* and friends can come from it
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let pool = manager::connect(&config.database);
    let ping_pool = pool.clone();
    tokio::spawn(async move {
        match manager::health_check(&ping_pool).await {
            Ok(()) => info!("Database reachable"),
            Err(e) => warn!("Database not reachable yet: {}", e),
        }
    });

    let store = PgStore::new(pool.clone(), RetryPolicy::from_config(&config.database));
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("dify-admin-api listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
