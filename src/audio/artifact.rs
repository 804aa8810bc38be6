//! Per-block audio artifacts
//!
//! Without a capture front-end attached, audio blocks still produce a WAV
//! file shaped by the configured recording parameters so the downstream
//! processing pipeline sees one artifact per block.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use crate::config::{AudioConfig, AudioFormat};

/// Write a silent WAV artifact covering the block duration.
pub fn write_block_artifact(path: &Path, config: &AudioConfig, duration_secs: f64) -> Result<()> {
    let spec = WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: config.format.bits_per_sample(),
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create audio artifact: {}", path.display()))?;

    let frames = (duration_secs * config.sample_rate as f64).round() as u64;
    let samples = frames * config.channels as u64;
    for _ in 0..samples {
        match config.format {
            AudioFormat::Bit16 => writer.write_sample(0i16)?,
            AudioFormat::Bit24 | AudioFormat::Bit32 => writer.write_sample(0i32)?,
        }
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize audio artifact: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_matches_configured_parameters() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("Audio_A1_Loop1_20250101_120000.wav");

        let config = AudioConfig::default();
        write_block_artifact(&path, &config, 0.25).expect("write artifact");

        let reader = hound::WavReader::open(&path).expect("open artifact");
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, config.sample_rate);
        assert_eq!(spec.channels, config.channels);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), config.sample_rate / 4);
    }
}
