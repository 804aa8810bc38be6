//! Experiment controller: owns the run lifecycle and the device handle
//!
//! One controller instance runs at most one experiment at a time. Control
//! operations (start/stop/status) execute on the caller's task; the block
//! sequence itself runs on a dedicated tokio task that checks a cancellation
//! token at loop and block boundaries and inside every timed wait.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::audio;
use crate::config::ExperimentConfig;
use crate::pipeline::{
    AudioPipeline, AudioProcessingReport, PipelineStatus, PipelineTracker, TextAnalysisReport,
    TextAnalyzer,
};
use crate::recorder::{EegRecorder, DEFAULT_MARKER_TYPE};
use crate::session::blocks::{blocks_for_loop, AudioSlot, Block, BlockKind, EegSlot};
use crate::session::naming;
use crate::session::state::{new_shared_state, RunPhase, RunState, SharedRunState};
use crate::{ElicitError, Result};

/// Shared handle to the recorder device
pub type SharedRecorder = Arc<Mutex<Box<dyn EegRecorder>>>;

/// Background run task plus its cancellation signal
struct RunWorker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// How a finished block sequence ended
enum RunOutcome {
    Completed,
    Cancelled,
}

/// Everything the run task needs, cloned out of the controller at start
struct RunContext {
    config: ExperimentConfig,
    session_dir: PathBuf,
    state: SharedRunState,
    recorder: SharedRecorder,
    cancel: CancellationToken,
}

pub struct ExperimentController {
    config: RwLock<ExperimentConfig>,
    config_path: PathBuf,
    recorder: SharedRecorder,
    run: SharedRunState,
    worker: Mutex<Option<RunWorker>>,
    /// Session directory prepared by `initialize_session`, claimed by the
    /// next `start`
    prepared_dir: Mutex<Option<PathBuf>>,
    audio_pipeline: Arc<dyn AudioPipeline>,
    text_analyzer: Arc<dyn TextAnalyzer>,
    audio_status: PipelineTracker<AudioProcessingReport>,
    text_status: PipelineTracker<TextAnalysisReport>,
}

impl ExperimentController {
    pub fn new(
        config: ExperimentConfig,
        config_path: PathBuf,
        recorder: Box<dyn EegRecorder>,
        audio_pipeline: Arc<dyn AudioPipeline>,
        text_analyzer: Arc<dyn TextAnalyzer>,
    ) -> Self {
        Self {
            config: RwLock::new(config),
            config_path,
            recorder: Arc::new(Mutex::new(recorder)),
            run: new_shared_state(),
            worker: Mutex::new(None),
            prepared_dir: Mutex::new(None),
            audio_pipeline,
            text_analyzer,
            audio_status: PipelineTracker::new(),
            text_status: PipelineTracker::new(),
        }
    }

    /// Current configuration (copy)
    pub async fn config(&self) -> ExperimentConfig {
        self.config.read().await.clone()
    }

    /// Validate, persist, and activate a new configuration wholesale
    pub async fn save_config(&self, new_config: ExperimentConfig) -> Result<()> {
        new_config.validate().map_err(ElicitError::Config)?;

        new_config
            .save(&self.config_path)
            .map_err(|e| ElicitError::Config(format!("{e:#}")))?;

        *self.config.write().await = new_config;
        info!("Saved experiment configuration");
        Ok(())
    }

    /// Prepare a session: create its directory, write the cue tone, and
    /// initialize the recorder device. Returns the device version string.
    pub async fn initialize_session(&self) -> Result<String> {
        let config = self.config().await;
        let session_dir = naming::create_session_dir(Path::new(&config.directories.output))?;
        info!("Created session directory: {}", session_dir.display());

        audio::write_tone_file(&session_dir.join("tone.wav"))
            .map_err(|e| ElicitError::Io(std::io::Error::other(format!("{e:#}"))))?;

        let version = {
            let mut recorder = self.recorder.lock().await;
            recorder.initialize().await?
        };

        *self.prepared_dir.lock().await = Some(session_dir);
        Ok(version)
    }

    /// Start the experiment run.
    ///
    /// Rejects when a run is active; otherwise spawns the block sequence on
    /// a background task and returns immediately.
    pub async fn start(&self) -> Result<()> {
        let config = self.config().await;
        config.validate().map_err(ElicitError::Config)?;

        let mut worker = self.worker.lock().await;
        if let Some(active) = worker.as_ref() {
            if !active.handle.is_finished() {
                return Err(ElicitError::AlreadyRunning);
            }
        }
        // The previous run has fully exited; forget its worker.
        *worker = None;

        let session_dir = match self.prepared_dir.lock().await.take() {
            Some(dir) => dir,
            None => naming::create_session_dir(Path::new(&config.directories.output))?,
        };

        if config.eeg_config.require_device {
            let mut recorder = self.recorder.lock().await;
            let version = recorder.initialize().await?;
            info!("Recorder ready ({version})");

            let eeg_path = session_dir.join(naming::eeg_filename(&Local::now()));
            if let Err(e) = recorder.start_recording(&eeg_path).await {
                // Failed start must not leave the device session dangling.
                if let Err(release) = recorder.stop_recording().await {
                    warn!("Failed to release recorder after aborted start: {release}");
                }
                return Err(e);
            }
        }

        self.run.write().await.begin(session_dir.clone());

        let cancel = CancellationToken::new();
        let ctx = RunContext {
            config,
            session_dir,
            state: self.run.clone(),
            recorder: self.recorder.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(run_blocks(ctx));
        *worker = Some(RunWorker { handle, cancel });

        info!("Experiment started");
        Ok(())
    }

    /// Stop the experiment run.
    ///
    /// Signals cancellation and waits until the run task has fully exited,
    /// then releases the recorder. A no-op success when nothing is running.
    pub async fn stop(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        let Some(active) = worker.take() else {
            return Ok(());
        };

        active.cancel.cancel();
        if let Err(join_err) = active.handle.await {
            error!("Run task aborted abnormally: {join_err}");
            self.run
                .write()
                .await
                .finish(RunPhase::Failed, Some(format!("run task aborted: {join_err}")));
        }

        let result = {
            let mut recorder = self.recorder.lock().await;
            recorder.stop_recording().await
        };

        info!("Experiment stopped");
        result
    }

    /// Point-in-time snapshot of the run state
    pub async fn status(&self) -> RunState {
        self.run.read().await.clone()
    }

    /// Kick off audio transcription for the current session directory
    pub async fn process_audio(&self) -> Result<()> {
        let session_dir = self.require_session_dir().await?;

        if !self.audio_status.try_begin().await {
            return Err(ElicitError::Pipeline(
                "Audio processing is already in progress".to_string(),
            ));
        }

        let pipeline = self.audio_pipeline.clone();
        let tracker = self.audio_status.clone();
        tokio::spawn(async move {
            let result = pipeline.process_session(&session_dir).await;
            tracker.finish(result).await;
        });

        info!("Audio processing started");
        Ok(())
    }

    /// Kick off text-feature analysis for the current session directory
    pub async fn analyze_text(&self) -> Result<()> {
        let session_dir = self.require_session_dir().await?;

        if !self.text_status.try_begin().await {
            return Err(ElicitError::Pipeline(
                "Text analysis is already in progress".to_string(),
            ));
        }

        let analyzer = self.text_analyzer.clone();
        let tracker = self.text_status.clone();
        tokio::spawn(async move {
            let result = analyzer.analyze_session(&session_dir).await;
            tracker.finish(result).await;
        });

        info!("Text analysis started");
        Ok(())
    }

    pub async fn audio_processing_status(&self) -> PipelineStatus<AudioProcessingReport> {
        self.audio_status.snapshot().await
    }

    pub async fn text_analysis_status(&self) -> PipelineStatus<TextAnalysisReport> {
        self.text_status.snapshot().await
    }

    async fn require_session_dir(&self) -> Result<PathBuf> {
        self.run
            .read()
            .await
            .session_dir
            .clone()
            .ok_or_else(|| ElicitError::Pipeline("No active session directory".to_string()))
    }
}

/// Run the full block sequence and settle the terminal state.
///
/// Every exit path ends with the running flag cleared and the recorder
/// released; errors never escape this task.
async fn run_blocks(ctx: RunContext) {
    let outcome = execute_sequence(&ctx).await;

    {
        let mut state = ctx.state.write().await;
        match outcome {
            Ok(RunOutcome::Completed) => {
                info!("Experiment completed after {} loops", state.current_loop);
                state.finish(RunPhase::Completed, None);
            }
            Ok(RunOutcome::Cancelled) => {
                info!("Experiment cancelled during loop {}", state.current_loop);
                state.finish(RunPhase::Cancelled, None);
            }
            Err(e) => {
                error!("Experiment failed: {e}");
                state.finish(RunPhase::Failed, Some(e.to_string()));
            }
        }
    }

    let mut recorder = ctx.recorder.lock().await;
    if let Err(e) = recorder.stop_recording().await {
        warn!("Failed to release recorder after run: {e}");
    }
}

async fn execute_sequence(ctx: &RunContext) -> Result<RunOutcome> {
    let num_loops = ctx.config.num_loops;

    for loop_index in 1..=num_loops {
        if ctx.cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        ctx.state.write().await.current_loop = loop_index;
        info!("Starting loop {loop_index}/{num_loops}");

        for block in blocks_for_loop(loop_index, &ctx.config.block_durations) {
            if ctx.cancel.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }
            if !execute_block(ctx, &block).await? {
                return Ok(RunOutcome::Cancelled);
            }
        }

        info!("Completed loop {loop_index}/{num_loops}");
    }

    Ok(RunOutcome::Completed)
}

/// Execute one block. Returns false when cancelled mid-wait.
async fn execute_block(ctx: &RunContext, block: &Block) -> Result<bool> {
    ctx.state.write().await.current_block = Some(*block);
    info!(
        "Running block {} ({}s, loop {})",
        block.kind.label(),
        block.duration_secs,
        block.loop_index
    );

    let completed = match block.kind {
        BlockKind::AudioRecording { slot } => run_audio_block(ctx, block, slot).await?,
        BlockKind::EegRecording { slot } => run_eeg_block(ctx, block, slot).await?,
        // Loop advancement after an intermission belongs to the outer loop.
        BlockKind::Lag | BlockKind::Intermission => wait_out(ctx, block.duration_secs).await,
    };

    if completed {
        info!("Completed block {}", block.kind.label());
    }
    Ok(completed)
}

async fn run_audio_block(ctx: &RunContext, block: &Block, slot: AudioSlot) -> Result<bool> {
    if !wait_out(ctx, block.duration_secs).await {
        return Ok(false);
    }

    let filename = naming::audio_block_filename(slot.label(), block.loop_index, &Local::now());
    let path = ctx.session_dir.join(filename);
    audio::write_block_artifact(&path, &ctx.config.audio_config, block.duration_secs)
        .map_err(|e| ElicitError::Block(format!("audio artifact: {e:#}")))?;

    ctx.state.write().await.audio_files.push(path);
    Ok(true)
}

async fn run_eeg_block(ctx: &RunContext, block: &Block, slot: EegSlot) -> Result<bool> {
    let markers = ctx.config.eeg_config.markers;

    if markers {
        let label = format!("{}_Block_Start_Loop{}", slot.label(), block.loop_index);
        insert_marker_nonfatal(ctx, &label).await;
    }

    if !wait_out(ctx, block.duration_secs).await {
        return Ok(false);
    }

    if markers {
        let label = format!("{}_Block_End_Loop{}", slot.label(), block.loop_index);
        insert_marker_nonfatal(ctx, &label).await;
    }

    Ok(true)
}

/// Marker failures are logged but never abort the block: without a device
/// session there is legitimately nothing to mark.
async fn insert_marker_nonfatal(ctx: &RunContext, description: &str) {
    let mut recorder = ctx.recorder.lock().await;
    if let Err(e) = recorder.insert_marker(description, DEFAULT_MARKER_TYPE).await {
        warn!("Marker '{description}' not inserted: {e}");
    }
}

/// Wait out a block duration, returning false when cancelled first
async fn wait_out(ctx: &RunContext, duration_secs: f64) -> bool {
    if duration_secs <= 0.0 {
        return !ctx.cancel.is_cancelled();
    }

    tokio::select! {
        _ = ctx.cancel.cancelled() => false,
        _ = tokio::time::sleep(Duration::from_secs_f64(duration_secs)) => true,
    }
}
