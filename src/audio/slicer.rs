use crate::types::{AudioData, TimeInterval};

/// Extract the samples covering `interval`, clamped to the waveform length.
///
/// Degenerate intervals and ranges past the end of the audio yield an empty
/// (but valid) slice rather than an error.
pub fn slice_interval(audio: &AudioData, interval: TimeInterval) -> AudioData {
    let rate = audio.sample_rate as u64;
    let to_sample = |ms: u64| ((ms * rate) / 1000) as usize;

    let start = to_sample(interval.start_ms).min(audio.samples.len());
    let end = to_sample(interval.end_ms).clamp(start, audio.samples.len());

    AudioData {
        samples: audio.samples[start..end].to_vec(),
        sample_rate: audio.sample_rate,
    }
}
