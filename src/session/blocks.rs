//! Block catalog: the timed units one experiment loop is made of

use crate::config::BlockDurations;

/// Speech recording slots within a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSlot {
    A1,
    A2,
}

impl AudioSlot {
    pub fn label(&self) -> &'static str {
        match self {
            AudioSlot::A1 => "A1",
            AudioSlot::A2 => "A2",
        }
    }
}

/// EEG recording slots within a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EegSlot {
    B1,
    B2,
}

impl EegSlot {
    pub fn label(&self) -> &'static str {
        match self {
            EegSlot::B1 => "B1",
            EegSlot::B2 => "B2",
        }
    }
}

/// Kind of a timed experiment block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Record the participant's speech for the block duration
    AudioRecording { slot: AudioSlot },
    /// Mark a window in the EEG stream and wait it out
    EegRecording { slot: EegSlot },
    /// Short pause between recording blocks
    Lag,
    /// Rest period closing a loop
    Intermission,
}

impl BlockKind {
    /// Label matching the configured duration name
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::AudioRecording { slot } => slot.label(),
            BlockKind::EegRecording { slot } => slot.label(),
            BlockKind::Lag => "Lag",
            BlockKind::Intermission => "Intermission",
        }
    }
}

/// One timed unit of experiment execution, immutable once constructed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub duration_secs: f64,
    pub loop_index: u32,
}

impl Block {
    fn new(kind: BlockKind, duration_secs: f64, loop_index: u32) -> Self {
        Self {
            kind,
            duration_secs,
            loop_index,
        }
    }
}

/// Produce the ordered block sequence for one loop.
///
/// Pure and deterministic. Every experiment type currently yields the full
/// six-block ordering; partial/simple variants are a reserved extension
/// point.
pub fn blocks_for_loop(loop_index: u32, durations: &BlockDurations) -> Vec<Block> {
    vec![
        Block::new(
            BlockKind::AudioRecording {
                slot: AudioSlot::A1,
            },
            durations.a1,
            loop_index,
        ),
        Block::new(
            BlockKind::AudioRecording {
                slot: AudioSlot::A2,
            },
            durations.a2,
            loop_index,
        ),
        Block::new(
            BlockKind::EegRecording { slot: EegSlot::B1 },
            durations.b1,
            loop_index,
        ),
        Block::new(
            BlockKind::EegRecording { slot: EegSlot::B2 },
            durations.b2,
            loop_index,
        ),
        Block::new(BlockKind::Lag, durations.lag, loop_index),
        Block::new(BlockKind::Intermission, durations.intermission, loop_index),
    ]
}
