//! elicit - EEG/speech experiment backend
//!
//! Entry point: wires the recorder, pipelines, and controller together and
//! serves the HTTP API.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use elicit::config::{ExperimentConfig, Settings};
use elicit::pipeline::PipelineClient;
use elicit::recorder;
use elicit::server;
use elicit::session::ExperimentController;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let settings = Settings::load()?;
    settings.ensure_dirs()?;

    let config_path = settings.experiment_config_path();
    let config = ExperimentConfig::load(&config_path)?;

    // Capability detection happens once; the controller never re-probes.
    let probe = recorder::probe_device(&settings.recorder).await;
    info!(
        "Recorder probe: {} reachable = {}",
        probe.address, probe.remote_reachable
    );
    let device = recorder::create_recorder(&probe, &settings.recorder)?;

    let pipeline = Arc::new(PipelineClient::from_settings(&settings)?);
    let controller = Arc::new(ExperimentController::new(
        config,
        config_path,
        device,
        pipeline.clone(),
        pipeline,
    ));

    server::run(&settings, controller).await
}
