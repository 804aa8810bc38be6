//! HTTP client for the external processing service

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;

use crate::config::Settings;
use crate::pipeline::{AudioPipeline, AudioProcessingReport, TextAnalysisReport, TextAnalyzer};

#[derive(Debug)]
pub struct PipelineClient {
    http: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    session_dir: &'a str,
}

impl PipelineClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let endpoint = settings
            .pipeline
            .endpoint
            .trim()
            .trim_end_matches('/')
            .to_string();
        if endpoint.is_empty() {
            anyhow::bail!("Processing service endpoint is missing. Set pipeline.endpoint in settings.");
        }

        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(settings.pipeline.timeout_secs))
                .build()
                .context("Failed to build pipeline HTTP client")?,
            endpoint,
        })
    }

    async fn post_session<T: serde::de::DeserializeOwned>(
        &self,
        route: &str,
        session_dir: &Path,
    ) -> Result<T> {
        let url = format!("{}/{}", self.endpoint, route);
        let session_dir = session_dir.display().to_string();
        let body = SessionRequest {
            session_dir: &session_dir,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Processing service request failed: {url}"))?;

        let response = response
            .error_for_status()
            .context("Processing service returned an error status")?;

        response
            .json()
            .await
            .context("Failed to parse processing service response")
    }
}

#[async_trait]
impl AudioPipeline for PipelineClient {
    async fn process_session(&self, session_dir: &Path) -> Result<AudioProcessingReport> {
        self.post_session("process-audio", session_dir).await
    }
}

#[async_trait]
impl TextAnalyzer for PipelineClient {
    async fn analyze_session(&self, session_dir: &Path) -> Result<TextAnalysisReport> {
        self.post_session("analyze-text", session_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn trims_trailing_slash_from_endpoint() {
        let mut settings = Settings::default();
        settings.pipeline.endpoint = "http://analysis.local:8001/".to_string();

        let client = PipelineClient::from_settings(&settings).expect("build client");
        assert_eq!(client.endpoint, "http://analysis.local:8001");
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let mut settings = Settings::default();
        settings.pipeline.endpoint = "  ".to_string();

        let err = PipelineClient::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }
}
