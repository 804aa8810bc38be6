//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::recorder::RecorderBackend;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// HTTP API settings
    #[serde(default)]
    pub server: ServerSettings,

    /// EEG recorder settings
    #[serde(default)]
    pub recorder: RecorderSettings,

    /// External processing pipeline settings
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Directory holding the experiment configuration JSON
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the HTTP API binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderSettings {
    /// Recorder backend to use (auto, remote, simulated)
    #[serde(default)]
    pub backend: RecorderBackend,

    /// Address of the vendor recorder's remote-control port
    #[serde(default = "default_recorder_addr")]
    pub address: String,

    /// Timeout for reaching the remote-control port, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Base URL of the audio processing / text analysis service
    #[serde(default = "default_pipeline_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds (transcription runs are slow)
    #[serde(default = "default_pipeline_timeout")]
    pub timeout_secs: u64,
}

// Default value functions

fn default_config_dir() -> PathBuf {
    PathBuf::from("configs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:5001".to_string()
}

fn default_recorder_addr() -> String {
    // Vendor recorder remote-control server port
    "127.0.0.1:6700".to_string()
}

fn default_connect_timeout() -> u64 {
    2
}

fn default_pipeline_endpoint() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_pipeline_timeout() -> u64 {
    300
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            backend: RecorderBackend::default(),
            address: default_recorder_addr(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            endpoint: default_pipeline_endpoint(),
            timeout_secs: default_pipeline_timeout(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            recorder: RecorderSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read settings file: {}", config_path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", config_path.display()))?;

        Ok(settings)
    }

    /// Get the path to the settings file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "elicit", "elicit")
            .context("Could not determine config directory")?;

        Ok(dirs.config_dir().join("settings.toml"))
    }

    /// Write default settings to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path of the persisted experiment configuration
    pub fn experiment_config_path(&self) -> PathBuf {
        self.general.config_dir.join("experiment_config.json")
    }

    /// Ensure required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.general.config_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_loopback_api() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind_addr, "127.0.0.1:5001");
        assert_eq!(settings.recorder.backend, RecorderBackend::Auto);
    }

    #[test]
    fn experiment_config_lives_under_config_dir() {
        let settings = Settings::default();
        assert_eq!(
            settings.experiment_config_path(),
            PathBuf::from("configs/experiment_config.json")
        );
    }

    #[test]
    fn parses_partial_settings_file() {
        let settings: Settings = toml::from_str(
            r#"
            [recorder]
            backend = "simulated"
            "#,
        )
        .expect("parse settings");

        assert_eq!(settings.recorder.backend, RecorderBackend::Simulated);
        assert_eq!(settings.pipeline.timeout_secs, 300);
    }
}
