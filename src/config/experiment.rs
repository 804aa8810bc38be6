//! Experiment configuration: the document the front-end edits
//!
//! Persisted as JSON under the configs directory and replaced wholesale on
//! every save. The controller only ever works with a validated copy.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which block kinds an experiment includes.
///
/// Only `Full` currently affects block generation; `Partial` and `Simple` are
/// accepted by validation as an extension point and produce the full sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentType {
    #[default]
    Full,
    Partial,
    Simple,
}

/// Sample format for recorded audio artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioFormat {
    #[default]
    #[serde(rename = "16bit")]
    Bit16,
    #[serde(rename = "24bit")]
    Bit24,
    #[serde(rename = "32bit")]
    Bit32,
}

impl AudioFormat {
    /// Bits per sample for WAV headers
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            AudioFormat::Bit16 => 16,
            AudioFormat::Bit24 => 24,
            AudioFormat::Bit32 => 32,
        }
    }
}

/// Per-block durations in seconds, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BlockDurations {
    pub a1: f64,
    pub a2: f64,
    pub b1: f64,
    pub b2: f64,
    pub lag: f64,
    pub intermission: f64,
}

impl Default for BlockDurations {
    fn default() -> Self {
        Self {
            a1: 45.0,
            a2: 45.0,
            b1: 45.0,
            b2: 45.0,
            lag: 5.0,
            intermission: 60.0,
        }
    }
}

impl BlockDurations {
    /// Durations paired with their configuration names, in catalog order
    pub fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("A1", self.a1),
            ("A2", self.a2),
            ("B1", self.b1),
            ("B2", self.b2),
            ("Lag", self.lag),
            ("Intermission", self.intermission),
        ]
    }
}

/// Audio recording parameters for block artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: AudioFormat,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            format: AudioFormat::Bit16,
        }
    }
}

/// EEG recording parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EegConfig {
    /// Whether a run may start without the recorder device
    pub require_device: bool,
    /// Whether block boundary markers are inserted into the EEG stream
    pub markers: bool,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            require_device: true,
            markers: true,
        }
    }
}

/// Experiment data directories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base: String,
    pub input: String,
    pub output: String,
    pub temp: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base: "experiment_data".to_string(),
            input: "experiment_data/input".to_string(),
            output: "experiment_data/output".to_string(),
            temp: "experiment_data/temp".to_string(),
        }
    }
}

/// The full experiment configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub experiment_type: ExperimentType,
    pub num_loops: u32,
    pub block_durations: BlockDurations,
    pub audio_config: AudioConfig,
    pub eeg_config: EegConfig,
    pub directories: DirectoryConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment_type: ExperimentType::default(),
            num_loops: 5,
            block_durations: BlockDurations::default(),
            audio_config: AudioConfig::default(),
            eeg_config: EegConfig::default(),
            directories: DirectoryConfig::default(),
        }
    }
}

/// Bounds on validated fields
const MIN_LOOPS: u32 = 1;
const MAX_LOOPS: u32 = 20;
const MAX_BLOCK_SECS: f64 = 120.0;
const SUPPORTED_SAMPLE_RATES: [u32; 3] = [44_100, 48_000, 96_000];

impl ExperimentConfig {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No experiment config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read experiment config: {}", path.display()))?;

        let config: ExperimentConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse experiment config: {}", path.display()))?;

        Ok(config)
    }

    /// Persist the configuration as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write experiment config: {}", path.display()))?;

        Ok(())
    }

    /// Check the configuration against the accepted bounds.
    ///
    /// Returns a human-readable reason on the first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(MIN_LOOPS..=MAX_LOOPS).contains(&self.num_loops) {
            return Err(format!(
                "Number of loops must be between {} and {}",
                MIN_LOOPS, MAX_LOOPS
            ));
        }

        for (name, duration) in self.block_durations.named() {
            if !(0.0..=MAX_BLOCK_SECS).contains(&duration) || !duration.is_finite() {
                return Err(format!("Invalid duration for block {}", name));
            }
        }

        if !SUPPORTED_SAMPLE_RATES.contains(&self.audio_config.sample_rate) {
            return Err(format!(
                "Invalid sample rate: {}",
                self.audio_config.sample_rate
            ));
        }

        if self.audio_config.channels == 0 {
            return Err("Audio channel count must be at least 1".to_string());
        }

        let dirs = [
            ("base", &self.directories.base),
            ("input", &self.directories.input),
            ("output", &self.directories.output),
            ("temp", &self.directories.temp),
        ];
        for (name, path) in dirs {
            if path.trim().is_empty() {
                return Err(format!("Missing {} directory path", name));
            }
        }

        Ok(())
    }
}
