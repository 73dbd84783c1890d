// main.rs
mod color;
mod commands;
mod config;
mod devices;
mod docs;
mod error;
mod handlers;
mod matcher;
mod metrics;
mod models;
mod query;
mod registry;

use devices::magic_home::{MagicHomeController, MagicHomeDiscoverer};
use models::AppState;
use registry::DeviceRegistry;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::Settings::new()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    if settings.metrics.enabled {
        metrics::setup_metrics(settings.metrics.port)?;
    }

    let controller = Arc::new(MagicHomeController::new(
        settings.control.port,
        settings.control.timeout(),
    ));
    let registry = Arc::new(DeviceRegistry::new(
        Arc::new(MagicHomeDiscoverer::new()),
        settings.discovery.timeout(),
    ));
    // First scan runs in the background; requests see an empty inventory until it lands.
    Arc::clone(&registry).spawn_refresh_loop(settings.discovery.interval());

    let state = Arc::new(AppState::new(registry, controller));
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&settings.server.address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind address: {}", e))?;

    tracing::info!("Server running on {}", settings.server.address);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
