//! External post-processing pipelines
//!
//! Audio transcription and text-feature analysis run in a separate
//! processing service. This module owns only the call/result contracts and
//! the per-operation progress records; it never implements the processing
//! itself.

mod client;

pub use client::PipelineClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Summary counters returned by the audio processing service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub total_files: usize,
    pub processed_files: usize,
    pub total_sentences: usize,
}

/// Result of transcribing a session's audio artifacts.
///
/// Row schema is owned by the processing service; the backend passes it
/// through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioProcessingReport {
    pub transcriptions: serde_json::Value,
    pub summary: ProcessingSummary,
}

/// Result of analysing the transcribed text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnalysisReport {
    pub analysis: serde_json::Value,
}

/// Contract for the audio transcription service
#[async_trait]
pub trait AudioPipeline: Send + Sync {
    async fn process_session(&self, session_dir: &Path) -> anyhow::Result<AudioProcessingReport>;
}

/// Contract for the text-feature analysis service
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze_session(&self, session_dir: &Path) -> anyhow::Result<TextAnalysisReport>;
}

/// Progress record of one long-running pipeline operation
#[derive(Debug, Clone)]
pub struct PipelineStatus<T> {
    pub in_progress: bool,
    pub results: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for PipelineStatus<T> {
    fn default() -> Self {
        Self {
            in_progress: false,
            results: None,
            error: None,
        }
    }
}

/// Shared tracker for one pipeline operation.
///
/// Guarantees a single run at a time and always clears the in-progress flag
/// when the operation settles.
#[derive(Clone)]
pub struct PipelineTracker<T> {
    inner: Arc<RwLock<PipelineStatus<T>>>,
}

impl<T: Clone + Send + Sync + 'static> PipelineTracker<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(PipelineStatus::default())),
        }
    }

    /// Point-in-time copy of the status record
    pub async fn snapshot(&self) -> PipelineStatus<T> {
        self.inner.read().await.clone()
    }

    /// Claim the tracker for a new run.
    ///
    /// Returns false when a run is already in progress. On success the
    /// previous results and error are cleared.
    pub async fn try_begin(&self) -> bool {
        let mut status = self.inner.write().await;
        if status.in_progress {
            return false;
        }

        *status = PipelineStatus {
            in_progress: true,
            results: None,
            error: None,
        };
        true
    }

    /// Record the outcome and release the tracker
    pub async fn finish(&self, result: anyhow::Result<T>) {
        let mut status = self.inner.write().await;
        status.in_progress = false;
        match result {
            Ok(value) => status.results = Some(value),
            Err(e) => {
                tracing::error!("Pipeline operation failed: {e:#}");
                status.error = Some(format!("{e:#}"));
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for PipelineTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracker_rejects_overlapping_runs() {
        let tracker: PipelineTracker<u32> = PipelineTracker::new();

        assert!(tracker.try_begin().await);
        assert!(!tracker.try_begin().await);

        tracker.finish(Ok(7)).await;
        let status = tracker.snapshot().await;
        assert!(!status.in_progress);
        assert_eq!(status.results, Some(7));

        assert!(tracker.try_begin().await);
        let status = tracker.snapshot().await;
        assert!(status.results.is_none(), "begin clears stale results");
    }

    #[tokio::test]
    async fn tracker_records_failure() {
        let tracker: PipelineTracker<u32> = PipelineTracker::new();

        assert!(tracker.try_begin().await);
        tracker.finish(Err(anyhow::anyhow!("service unavailable"))).await;

        let status = tracker.snapshot().await;
        assert!(!status.in_progress);
        assert!(status.results.is_none());
        assert!(status.error.unwrap().contains("service unavailable"));
    }
}
