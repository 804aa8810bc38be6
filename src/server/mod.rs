//! HTTP control surface for the front-end

mod routes;

pub use routes::router;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Settings;
use crate::session::ExperimentController;

/// Serve the JSON API until the process is stopped
pub async fn run(settings: &Settings, controller: Arc<ExperimentController>) -> Result<()> {
    let app = router(controller);

    let listener = TcpListener::bind(&settings.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind API address {}", settings.server.bind_addr))?;

    info!("HTTP API listening on {}", settings.server.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
