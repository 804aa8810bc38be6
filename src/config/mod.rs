//! Configuration module for elicit
//!
//! Two layers: application settings (TOML, server/recorder/pipeline wiring)
//! and the experiment configuration the front-end edits (JSON, replaced
//! wholesale on save).

mod experiment;
mod settings;

pub use experiment::{
    AudioConfig, AudioFormat, BlockDurations, DirectoryConfig, EegConfig, ExperimentConfig,
    ExperimentType,
};
pub use settings::{GeneralSettings, PipelineSettings, RecorderSettings, ServerSettings, Settings};
