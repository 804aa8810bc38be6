//! Experiment session: block catalog, run state, naming, and the controller

pub mod blocks;
mod controller;
pub mod naming;
mod state;

pub use blocks::{blocks_for_loop, AudioSlot, Block, BlockKind, EegSlot};
pub use controller::ExperimentController;
pub use state::{new_shared_state, RunPhase, RunState, SharedRunState};
