//! EEG recorder device abstraction
//!
//! Provides a unified recorder contract with two backends:
//! - Remote (drives the vendor recording application over its TCP
//!   remote-control port)
//! - Simulated (in-memory state, writes a marker log instead of an EEG file)

mod remote;
mod simulated;

pub use remote::RemoteRecorder;
pub use simulated::SimulatedRecorder;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::RecorderSettings;
use crate::{ElicitError, Result};

/// Marker type used when the caller does not specify one
pub const DEFAULT_MARKER_TYPE: &str = "Comment";

/// Recorder backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderBackend {
    /// Pick the remote recorder when its control port is reachable
    #[default]
    Auto,
    /// Force the vendor recorder
    Remote,
    /// Force the simulated recorder
    Simulated,
}

/// Unified EEG recorder contract
///
/// `initialize` establishes the device session and must succeed before
/// `start_recording` or `insert_marker`. `stop_recording` releases the
/// session and is safe to call when nothing is recording.
#[async_trait]
pub trait EegRecorder: Send + Sync {
    /// Establish the device session; returns the device version string
    async fn initialize(&mut self) -> Result<String>;

    /// Begin recording into the given target file
    async fn start_recording(&mut self, target: &Path) -> Result<()>;

    /// Stop recording and release the device session (idempotent)
    async fn stop_recording(&mut self) -> Result<()>;

    /// Tag the recording stream with a timestamped label
    async fn insert_marker(&mut self, description: &str, marker_type: &str) -> Result<()>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Result of probing for the vendor recorder
#[derive(Debug, Clone)]
pub struct DeviceProbe {
    /// Address that was probed
    pub address: String,
    /// Whether the remote-control port accepted a connection
    pub remote_reachable: bool,
}

/// Check whether the vendor recorder's remote-control port is reachable.
///
/// Detection is separate from backend selection so both stay testable.
pub async fn probe_device(settings: &RecorderSettings) -> DeviceProbe {
    let timeout = Duration::from_secs(settings.connect_timeout_secs);
    let reachable = matches!(
        tokio::time::timeout(timeout, TcpStream::connect(&settings.address)).await,
        Ok(Ok(_))
    );

    if !reachable {
        tracing::debug!("Recorder control port {} not reachable", settings.address);
    }

    DeviceProbe {
        address: settings.address.clone(),
        remote_reachable: reachable,
    }
}

/// Create a recorder instance from a probe result and settings
pub fn create_recorder(
    probe: &DeviceProbe,
    settings: &RecorderSettings,
) -> Result<Box<dyn EegRecorder>> {
    match settings.backend {
        RecorderBackend::Auto => {
            if probe.remote_reachable {
                tracing::info!("Using remote EEG recorder (auto-detected)");
                Ok(Box::new(RemoteRecorder::new(settings)))
            } else {
                tracing::info!("Using simulated EEG recorder (fallback)");
                Ok(Box::new(SimulatedRecorder::new()))
            }
        }
        RecorderBackend::Remote => {
            if !probe.remote_reachable {
                return Err(ElicitError::DeviceInit(format!(
                    "Remote recorder forced but {} is not reachable",
                    probe.address
                )));
            }
            tracing::info!("Using remote EEG recorder (forced)");
            Ok(Box::new(RemoteRecorder::new(settings)))
        }
        RecorderBackend::Simulated => {
            tracing::info!("Using simulated EEG recorder (forced)");
            Ok(Box::new(SimulatedRecorder::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderSettings;

    fn probe(reachable: bool) -> DeviceProbe {
        DeviceProbe {
            address: "127.0.0.1:6700".to_string(),
            remote_reachable: reachable,
        }
    }

    #[test]
    fn auto_falls_back_to_simulated() {
        let settings = RecorderSettings::default();
        let recorder = create_recorder(&probe(false), &settings).expect("create recorder");
        assert_eq!(recorder.backend_name(), "simulated");
    }

    #[test]
    fn auto_prefers_remote_when_reachable() {
        let settings = RecorderSettings::default();
        let recorder = create_recorder(&probe(true), &settings).expect("create recorder");
        assert_eq!(recorder.backend_name(), "remote");
    }

    #[test]
    fn forced_remote_fails_when_unreachable() {
        let settings = RecorderSettings {
            backend: RecorderBackend::Remote,
            ..RecorderSettings::default()
        };

        let err = create_recorder(&probe(false), &settings).err().unwrap();
        assert!(matches!(err, ElicitError::DeviceInit(_)));
    }

    #[tokio::test]
    async fn probe_reports_unreachable_port() {
        let settings = RecorderSettings {
            // reserved port, nothing listens here
            address: "127.0.0.1:9".to_string(),
            connect_timeout_secs: 1,
            ..RecorderSettings::default()
        };

        let probe = probe_device(&settings).await;
        assert!(!probe.remote_reachable);
    }
}
