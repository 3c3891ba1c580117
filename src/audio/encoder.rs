use crate::audio::resample::resample;
use crate::types::AudioData;
use anyhow::{Context, Result};
use std::path::Path;

/// Sample rate every exported clip is normalized to.
pub const EXPORT_SAMPLE_RATE: u32 = 16_000;

/// Write audio as mono 16-bit WAV at `EXPORT_SAMPLE_RATE`, resampling if the
/// source rate differs.
pub fn export_wav<P: AsRef<Path>>(audio: &AudioData, path: P) -> Result<()> {
    export_wav_at(audio, path, EXPORT_SAMPLE_RATE)
}

/// Write audio as mono 16-bit WAV at an explicit sample rate.
pub fn export_wav_at<P: AsRef<Path>>(audio: &AudioData, path: P, sample_rate: u32) -> Result<()> {
    let path = path.as_ref();

    let normalized;
    let source = if audio.sample_rate == sample_rate {
        audio
    } else {
        normalized = resample(audio, sample_rate)?;
        &normalized
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for &sample in &source.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * 32767.0) as i16)
            .context("Failed to write audio sample")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    Ok(())
}
