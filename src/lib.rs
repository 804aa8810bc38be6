//! elicit - backend for running timed speech/EEG elicitation experiments
//!
//! Sequences timed experiment blocks (speech recording, EEG recording with
//! markers, rest periods), drives an EEG recorder through its remote-control
//! interface or a simulated stand-in, and exposes the control surface as a
//! JSON HTTP API for the front-end.

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod recorder;
pub mod server;
pub mod session;

use thiserror::Error;

/// Main error type for elicit
#[derive(Error, Debug)]
pub enum ElicitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device initialization failed: {0}")]
    DeviceInit(String),

    #[error("Device I/O error: {0}")]
    DeviceIo(String),

    #[error("Not recording")]
    NotRecording,

    #[error("Experiment already running")]
    AlreadyRunning,

    #[error("Block execution failed: {0}")]
    Block(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ElicitError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "elicit";
