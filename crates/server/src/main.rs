//! wishlist-edge server entry point.
//!
//! Installs and activates the configured cache generation, then serves the
//! share target, the health check, and the caching proxy in front of the
//! upstream app. Logs are JSON on stdout, filtered by `RUST_LOG`.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use wishlist_edge_core::AppConfig;

mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = AppConfig::load()?;
    let addr = config.listen_socket()?;
    let state = Arc::new(AppState::from_config(&config).await?);

    if let Err(e) = state.controller.install().await {
        tracing::error!(error = %e, version = %config.cache_version, "install failed");
        return Err(e.into());
    }

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        upstream = %config.upstream,
        version = %config.cache_version,
        storage = ?config.storage,
        "wishlist-edge listening"
    );

    axum::serve(listener, routes::router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.controller.settle_writes().await;
    tracing::info!(stats = ?state.controller.stats().snapshot(), "shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested, draining connections");
}
