//! Session directory and artifact naming
//!
//! Names combine timestamps with loop/block identifiers so artifacts from
//! repeated runs never collide.

use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Filesystem-safe timestamp used across all artifact names
pub fn timestamp(now: &DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Name of a session directory for a run starting at `now`
pub fn session_dir_name(now: &DateTime<Local>) -> String {
    format!("session_{}", timestamp(now))
}

/// Name of the artifact produced by one audio block
pub fn audio_block_filename(slot: &str, loop_index: u32, now: &DateTime<Local>) -> String {
    format!("Audio_{}_Loop{}_{}.wav", slot, loop_index, timestamp(now))
}

/// Name of the EEG recording target for a run starting at `now`
pub fn eeg_filename(now: &DateTime<Local>) -> String {
    format!("Experiment_{}.eeg", timestamp(now))
}

/// Create a fresh session directory under `output_dir`.
///
/// Two runs within the same second get distinct directories via a numeric
/// suffix.
pub fn create_session_dir(output_dir: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let base = session_dir_name(&Local::now());
    let mut candidate = output_dir.join(&base);
    let mut attempt = 1u32;

    loop {
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                attempt += 1;
                candidate = output_dir.join(format!("{base}_{attempt}"));
            }
            Err(e) => return Err(e),
        }
    }
}
