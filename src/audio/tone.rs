//! Cue tone generation

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

const TONE_SAMPLE_RATE: u32 = 44_100;
const TONE_DURATION_SECS: f32 = 0.5;
const TONE_FREQUENCY_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 0.5;

/// Write the cue tone played between experiment blocks.
///
/// Half a second of A4 sine at 44.1 kHz, float samples.
pub fn write_tone_file(path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TONE_SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create tone file: {}", path.display()))?;

    let total_samples = (TONE_SAMPLE_RATE as f32 * TONE_DURATION_SECS) as u32;
    for n in 0..total_samples {
        let t = n as f32 / TONE_SAMPLE_RATE as f32;
        let sample = TONE_AMPLITUDE * (2.0 * PI * TONE_FREQUENCY_HZ * t).sin();
        writer.write_sample(sample)?;
    }

    writer.finalize().context("Failed to finalize tone file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_half_second_of_audio() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tone.wav");

        write_tone_file(&path).expect("write tone");

        let reader = hound::WavReader::open(&path).expect("open tone");
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, TONE_SAMPLE_RATE);
        assert_eq!(spec.channels, 1);
        assert_eq!(reader.duration(), TONE_SAMPLE_RATE / 2);
    }
}
