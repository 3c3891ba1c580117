use crate::types::AudioData;
use anyhow::{ensure, Result};

/// Resample audio to `target_rate` with linear interpolation.
///
/// Quality is sufficient for speech-dataset export; callers wanting the
/// original rate get the input back untouched.
pub fn resample(audio: &AudioData, target_rate: u32) -> Result<AudioData> {
    ensure!(audio.sample_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");

    if audio.samples.is_empty() || audio.sample_rate == target_rate {
        return Ok(audio.clone());
    }

    let step = audio.sample_rate as f64 / target_rate as f64;
    let output_len =
        ((audio.samples.len() as f64 / step).ceil() as usize).max(1);
    let last = audio.samples.len() - 1;

    let mut samples = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let position = i as f64 * step;
        let left = (position.floor() as usize).min(last);
        let right = (left + 1).min(last);
        let t = (position - left as f64) as f32;
        samples.push(audio.samples[left] * (1.0 - t) + audio.samples[right] * t);
    }

    Ok(AudioData {
        samples,
        sample_rate: target_rate,
    })
}
