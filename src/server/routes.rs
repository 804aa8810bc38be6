//! Route handlers and wire types
//!
//! The wire format keeps the camelCase field names the front-end already
//! speaks; every control operation answers with a `{success, error?}`
//! envelope.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{
    AudioConfig, BlockDurations, DirectoryConfig, EegConfig, ExperimentConfig, ExperimentType,
};
use crate::pipeline::{AudioProcessingReport, PipelineStatus, TextAnalysisReport};
use crate::session::{Block, ExperimentController, RunPhase, RunState};

type Controller = Arc<ExperimentController>;

/// Build the API router
pub fn router(controller: Controller) -> Router {
    Router::new()
        .route("/api/get-config", get(get_config))
        .route("/api/save-config", post(save_config))
        .route("/api/initialize", post(initialize))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .route("/api/status", get(status))
        .route("/api/process-audio", post(process_audio))
        .route("/api/analyze-text", post(analyze_text))
        .route("/api/status/audio-processing", get(audio_processing_status))
        .route("/api/status/text-analysis", get(text_analysis_status))
        .with_state(controller)
}

// Wire types

#[derive(Debug, Serialize)]
struct ApiResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResult {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn from(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExperimentConfigDto {
    experiment_type: ExperimentType,
    num_loops: u32,
    block_durations: BlockDurations,
    audio_config: AudioConfigDto,
    eeg_config: EegConfigDto,
    directories: DirectoryConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfigDto {
    sample_rate: u32,
    channels: u16,
    format: crate::config::AudioFormat,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EegConfigDto {
    require_device: bool,
    markers: bool,
}

impl From<ExperimentConfig> for ExperimentConfigDto {
    fn from(config: ExperimentConfig) -> Self {
        Self {
            experiment_type: config.experiment_type,
            num_loops: config.num_loops,
            block_durations: config.block_durations,
            audio_config: AudioConfigDto {
                sample_rate: config.audio_config.sample_rate,
                channels: config.audio_config.channels,
                format: config.audio_config.format,
            },
            eeg_config: EegConfigDto {
                require_device: config.eeg_config.require_device,
                markers: config.eeg_config.markers,
            },
            directories: config.directories,
        }
    }
}

impl From<ExperimentConfigDto> for ExperimentConfig {
    fn from(dto: ExperimentConfigDto) -> Self {
        Self {
            experiment_type: dto.experiment_type,
            num_loops: dto.num_loops,
            block_durations: dto.block_durations,
            audio_config: AudioConfig {
                sample_rate: dto.audio_config.sample_rate,
                channels: dto.audio_config.channels,
                format: dto.audio_config.format,
            },
            eeg_config: EegConfig {
                require_device: dto.eeg_config.require_device,
                markers: dto.eeg_config.markers,
            },
            directories: dto.directories,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    success: bool,
    config: ExperimentConfigDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    config: Option<ExperimentConfigDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockDto {
    label: &'static str,
    duration_secs: f64,
    loop_index: u32,
}

impl From<Block> for BlockDto {
    fn from(block: Block) -> Self {
        Self {
            label: block.kind.label(),
            duration_secs: block.duration_secs,
            loop_index: block.loop_index,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    is_running: bool,
    phase: RunPhase,
    current_block: Option<BlockDto>,
    current_loop: u32,
    audio_files: Vec<PathBuf>,
    session_dir: Option<PathBuf>,
    error: Option<String>,
    audio_processing: AudioProcessingStatusDto,
    text_analysis: TextAnalysisStatusDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioProcessingStatusDto {
    is_processing: bool,
    results: Option<AudioProcessingReport>,
    error: Option<String>,
}

impl From<PipelineStatus<AudioProcessingReport>> for AudioProcessingStatusDto {
    fn from(status: PipelineStatus<AudioProcessingReport>) -> Self {
        Self {
            is_processing: status.in_progress,
            results: status.results,
            error: status.error,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextAnalysisStatusDto {
    is_analyzing: bool,
    results: Option<TextAnalysisReport>,
    error: Option<String>,
}

impl From<PipelineStatus<TextAnalysisReport>> for TextAnalysisStatusDto {
    fn from(status: PipelineStatus<TextAnalysisReport>) -> Self {
        Self {
            is_analyzing: status.in_progress,
            results: status.results,
            error: status.error,
        }
    }
}

fn status_response(
    run: RunState,
    audio: PipelineStatus<AudioProcessingReport>,
    text: PipelineStatus<TextAnalysisReport>,
) -> StatusResponse {
    StatusResponse {
        is_running: run.is_running(),
        phase: run.phase,
        current_block: run.current_block.map(BlockDto::from),
        current_loop: run.current_loop,
        audio_files: run.audio_files,
        session_dir: run.session_dir,
        error: run.last_error,
        audio_processing: audio.into(),
        text_analysis: text.into(),
    }
}

// Handlers

async fn get_config(State(controller): State<Controller>) -> Json<ConfigResponse> {
    let config = controller.config().await;
    Json(ConfigResponse {
        success: true,
        config: config.into(),
    })
}

async fn save_config(
    State(controller): State<Controller>,
    Json(dto): Json<ExperimentConfigDto>,
) -> Json<ApiResult> {
    Json(ApiResult::from(controller.save_config(dto.into()).await))
}

async fn initialize(State(controller): State<Controller>) -> Json<InitializeResponse> {
    match controller.initialize_session().await {
        Ok(version) => Json(InitializeResponse {
            success: true,
            version: Some(version),
            error: None,
        }),
        Err(e) => Json(InitializeResponse {
            success: false,
            version: None,
            error: Some(e.to_string()),
        }),
    }
}

async fn start(
    State(controller): State<Controller>,
    payload: Option<Json<StartRequest>>,
) -> Json<ApiResult> {
    // The front-end may push a config edit together with start.
    if let Some(Json(StartRequest {
        config: Some(config),
    })) = payload
    {
        if let Err(e) = controller.save_config(config.into()).await {
            return Json(ApiResult::from(Err(e)));
        }
    }

    Json(ApiResult::from(controller.start().await))
}

async fn stop(State(controller): State<Controller>) -> Json<ApiResult> {
    Json(ApiResult::from(controller.stop().await))
}

async fn status(State(controller): State<Controller>) -> Json<StatusResponse> {
    let run = controller.status().await;
    let audio = controller.audio_processing_status().await;
    let text = controller.text_analysis_status().await;
    Json(status_response(run, audio, text))
}

async fn process_audio(State(controller): State<Controller>) -> Json<ApiResult> {
    Json(ApiResult::from(controller.process_audio().await))
}

async fn analyze_text(State(controller): State<Controller>) -> Json<ApiResult> {
    Json(ApiResult::from(controller.analyze_text().await))
}

async fn audio_processing_status(
    State(controller): State<Controller>,
) -> Json<AudioProcessingStatusDto> {
    Json(controller.audio_processing_status().await.into())
}

async fn text_analysis_status(
    State(controller): State<Controller>,
) -> Json<TextAnalysisStatusDto> {
    Json(controller.text_analysis_status().await.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_wire_format_uses_camel_case() {
        let dto: ExperimentConfigDto = ExperimentConfig::default().into();
        let json = serde_json::to_value(&dto).expect("serialize");

        assert_eq!(json["numLoops"], 5);
        assert_eq!(json["audioConfig"]["sampleRate"], 44_100);
        assert_eq!(json["eegConfig"]["requireDevice"], true);
        assert_eq!(json["experimentType"], "full");
        assert!(json["blockDurations"]["Intermission"].is_number());
    }

    #[test]
    fn config_dto_round_trips() {
        let mut config = ExperimentConfig::default();
        config.num_loops = 9;
        config.eeg_config.markers = false;

        let dto: ExperimentConfigDto = config.clone().into();
        let back: ExperimentConfig = dto.into();
        assert_eq!(back, config);
    }

    #[test]
    fn status_snapshot_maps_pipeline_records() {
        let mut run = RunState::default();
        run.current_loop = 2;

        let response = status_response(
            run,
            PipelineStatus::default(),
            PipelineStatus::default(),
        );
        let json = serde_json::to_value(&response).expect("serialize");

        assert_eq!(json["isRunning"], false);
        assert_eq!(json["currentLoop"], 2);
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["audioProcessing"]["isProcessing"], false);
        assert_eq!(json["textAnalysis"]["isAnalyzing"], false);
    }
}
