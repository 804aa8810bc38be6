//! Shared run state for the experiment controller
//!
//! Written only by the run task while an experiment executes, read
//! concurrently by status queries. Snapshots are clones taken under the
//! read lock, never live references.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::session::blocks::Block;

/// Lifecycle of one experiment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// No run active
    #[default]
    Idle,
    /// Block sequence executing on the run task
    Running,
    /// All loops finished
    Completed,
    /// Stopped by an external request
    Cancelled,
    /// A block or device operation failed
    Failed,
}

impl RunPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, RunPhase::Running)
    }
}

/// Mutable state of the active (or most recent) run
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub phase: RunPhase,
    pub current_block: Option<Block>,
    pub current_loop: u32,
    pub audio_files: Vec<PathBuf>,
    pub session_dir: Option<PathBuf>,
    pub last_error: Option<String>,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// Seed the state for a fresh run
    pub fn begin(&mut self, session_dir: PathBuf) {
        *self = RunState {
            phase: RunPhase::Running,
            current_block: None,
            current_loop: 0,
            audio_files: Vec::new(),
            session_dir: Some(session_dir),
            last_error: None,
        };
    }

    /// Transition to a terminal phase.
    ///
    /// Clears the current block in the same write so a snapshot can never
    /// observe a terminal phase with a block still attached.
    pub fn finish(&mut self, phase: RunPhase, error: Option<String>) {
        self.phase = phase;
        self.current_block = None;
        if error.is_some() {
            self.last_error = error;
        }
    }
}

/// Thread-safe state container
pub type SharedRunState = Arc<RwLock<RunState>>;

/// Create a new shared run state
pub fn new_shared_state() -> SharedRunState {
    Arc::new(RwLock::new(RunState::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::blocks::{blocks_for_loop, BlockKind};
    use crate::config::BlockDurations;

    #[test]
    fn begin_resets_previous_run() {
        let mut state = RunState::default();
        state.begin(PathBuf::from("session_a"));
        state.current_loop = 4;
        state.audio_files.push(PathBuf::from("a.wav"));
        state.finish(RunPhase::Failed, Some("device unplugged".to_string()));

        state.begin(PathBuf::from("session_b"));
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.current_loop, 0);
        assert!(state.audio_files.is_empty());
        assert!(state.last_error.is_none());
        assert_eq!(state.session_dir, Some(PathBuf::from("session_b")));
    }

    #[test]
    fn finish_always_clears_current_block() {
        let durations = BlockDurations::default();
        let block = blocks_for_loop(1, &durations)
            .into_iter()
            .find(|b| b.kind == BlockKind::Lag)
            .unwrap();

        let mut state = RunState::default();
        state.begin(PathBuf::from("session"));
        state.current_block = Some(block);

        state.finish(RunPhase::Cancelled, None);
        assert!(!state.is_running());
        assert!(state.current_block.is_none());
        assert!(state.last_error.is_none());

        state.current_block = Some(block);
        state.finish(RunPhase::Failed, Some("boom".to_string()));
        assert!(state.current_block.is_none());
        assert_eq!(state.last_error.as_deref(), Some("boom"));
    }
}
