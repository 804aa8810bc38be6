//! Simulated EEG recorder for machines without the vendor application

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::recorder::EegRecorder;
use crate::{ElicitError, Result};

/// A marker collected during a simulated recording
#[derive(Debug, Clone, Serialize)]
pub struct MarkerEntry {
    pub description: String,
    pub marker_type: String,
    pub timestamp: DateTime<Local>,
}

/// In-memory recorder stand-in.
///
/// Instead of an EEG file it writes the collected markers as a JSON log next
/// to the recording target when the session stops.
#[derive(Debug, Default)]
pub struct SimulatedRecorder {
    recording: bool,
    target: Option<PathBuf>,
    markers: Vec<MarkerEntry>,
}

impl SimulatedRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers collected since the last `start_recording`
    pub fn markers(&self) -> &[MarkerEntry] {
        &self.markers
    }

    fn marker_log_path(target: &Path) -> PathBuf {
        target.with_extension("markers.json")
    }
}

#[async_trait]
impl EegRecorder for SimulatedRecorder {
    async fn initialize(&mut self) -> Result<String> {
        Ok("Simulated EEG Recorder 1.0".to_string())
    }

    async fn start_recording(&mut self, target: &Path) -> Result<()> {
        self.recording = true;
        self.target = Some(target.to_path_buf());
        self.markers.clear();
        tracing::info!("[simulation] Started EEG recording: {}", target.display());
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<()> {
        if !self.recording {
            return Ok(());
        }

        if let Some(target) = self.target.take() {
            let log_path = Self::marker_log_path(&target);
            let content = serde_json::to_string_pretty(&self.markers)
                .map_err(|e| ElicitError::DeviceIo(format!("marker log encoding: {e}")))?;
            std::fs::write(&log_path, content)?;
            tracing::info!("[simulation] Wrote marker log: {}", log_path.display());
        }

        self.recording = false;
        tracing::info!("[simulation] Stopped EEG recording");
        Ok(())
    }

    async fn insert_marker(&mut self, description: &str, marker_type: &str) -> Result<()> {
        if !self.recording {
            return Err(ElicitError::NotRecording);
        }

        self.markers.push(MarkerEntry {
            description: description.to_string(),
            marker_type: marker_type.to_string(),
            timestamp: Local::now(),
        });
        tracing::info!("[simulation] Marker inserted: {}", description);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::DEFAULT_MARKER_TYPE;

    #[tokio::test]
    async fn marker_requires_active_recording() {
        let mut recorder = SimulatedRecorder::new();
        recorder.initialize().await.expect("initialize");

        let err = recorder
            .insert_marker("Start", DEFAULT_MARKER_TYPE)
            .await
            .unwrap_err();
        assert!(matches!(err, ElicitError::NotRecording));

        let dir = tempfile::tempdir().expect("temp dir");
        recorder
            .start_recording(&dir.path().join("run.eeg"))
            .await
            .expect("start");
        recorder
            .insert_marker("Start", DEFAULT_MARKER_TYPE)
            .await
            .expect("marker while recording");

        recorder.stop_recording().await.expect("stop");
        let err = recorder
            .insert_marker("Late", DEFAULT_MARKER_TYPE)
            .await
            .unwrap_err();
        assert!(matches!(err, ElicitError::NotRecording));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut recorder = SimulatedRecorder::new();
        let dir = tempfile::tempdir().expect("temp dir");

        recorder
            .start_recording(&dir.path().join("run.eeg"))
            .await
            .expect("start");
        recorder.stop_recording().await.expect("first stop");
        recorder.stop_recording().await.expect("second stop");
        recorder.stop_recording().await.expect("stop while idle");
    }

    #[tokio::test]
    async fn stop_writes_marker_log() {
        let mut recorder = SimulatedRecorder::new();
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("Experiment_20250101_120000.eeg");

        recorder.start_recording(&target).await.expect("start");
        recorder
            .insert_marker("B1_Block_Start_Loop1", DEFAULT_MARKER_TYPE)
            .await
            .expect("marker");
        recorder
            .insert_marker("B1_Block_End_Loop1", DEFAULT_MARKER_TYPE)
            .await
            .expect("marker");
        recorder.stop_recording().await.expect("stop");

        let log_path = dir.path().join("Experiment_20250101_120000.markers.json");
        let content = std::fs::read_to_string(&log_path).expect("marker log exists");
        let entries: serde_json::Value = serde_json::from_str(&content).expect("valid json");
        assert_eq!(entries.as_array().map(Vec::len), Some(2));
    }
}
