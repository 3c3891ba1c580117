use crate::types::AudioData;
use anyhow::{bail, ensure, Result};

/// Tuning for intra-file silence removal before alignment.
#[derive(Debug, Clone, Copy)]
pub struct SilenceConfig {
    /// How far below the clip's overall loudness (dB) a window must fall
    /// to count as silent.
    pub threshold_db: f32,
    /// Minimum run of silent windows that qualifies for removal.
    pub min_silence_ms: u64,
    /// Silence kept at each edge of a voiced span, so words are not clipped.
    pub padding_ms: u64,
    /// Analysis window size.
    pub window_ms: u64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            threshold_db: 16.0,
            min_silence_ms: 300,
            padding_ms: 100,
            window_ms: 20,
        }
    }
}

/// Remove long intra-file silences and concatenate what remains.
///
/// Returns an error when the clip contains no voiced audio at all; such a
/// file is malformed input and the caller is expected to skip it.
pub fn strip_silence(audio: &AudioData, config: &SilenceConfig) -> Result<AudioData> {
    let spans = voiced_sample_spans(audio, config)?;

    let mut samples = Vec::new();
    for (start, end) in &spans {
        samples.extend_from_slice(&audio.samples[*start..*end]);
    }

    Ok(AudioData {
        samples,
        sample_rate: audio.sample_rate,
    })
}

/// Sample ranges judged voiced, padded by `padding_ms` into removed silence.
fn voiced_sample_spans(audio: &AudioData, config: &SilenceConfig) -> Result<Vec<(usize, usize)>> {
    ensure!(config.window_ms > 0, "analysis window must be positive");
    ensure!(audio.sample_rate > 0, "sample rate must be positive");

    let clip_rms = rms(&audio.samples);
    if audio.samples.is_empty() || clip_rms <= 1e-6 {
        // Digital silence has no reference loudness to measure against
        bail!("no non-silent spans found");
    }

    let rate = audio.sample_rate as u64;
    let window = ((config.window_ms * rate) / 1000).max(1) as usize;
    let min_silence = ((config.min_silence_ms * rate) / 1000) as usize;
    let padding = ((config.padding_ms * rate) / 1000) as usize;

    let threshold_db = to_db(clip_rms) - config.threshold_db;

    // Silent runs long enough to remove, as sample ranges
    let mut removable: Vec<(usize, usize)> = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut idx = 0;
    while idx < audio.samples.len() {
        let end = (idx + window).min(audio.samples.len());
        let silent = to_db(rms(&audio.samples[idx..end])) < threshold_db;
        match (silent, run_start) {
            (true, None) => run_start = Some(idx),
            (false, Some(start)) => {
                if idx - start >= min_silence {
                    removable.push((start, idx));
                }
                run_start = None;
            }
            _ => {}
        }
        idx = end;
    }
    if let Some(start) = run_start {
        if audio.samples.len() - start >= min_silence {
            removable.push((start, audio.samples.len()));
        }
    }

    // Voiced spans are the complement of the removable runs
    let len = audio.samples.len();
    let mut voiced = Vec::new();
    let mut cursor = 0usize;
    for (start, end) in &removable {
        if *start > cursor {
            voiced.push((cursor, *start));
        }
        cursor = *end;
    }
    if cursor < len {
        voiced.push((cursor, len));
    }

    if voiced.is_empty() {
        bail!("no non-silent spans found");
    }

    // Pad each voiced span into the adjacent removed silence, at most half
    // of each run per side so neighboring spans never overlap
    let spans = voiced
        .into_iter()
        .map(|(start, end)| {
            let left = removable
                .iter()
                .find(|(_, run_end)| *run_end == start)
                .map(|(run_start, run_end)| (run_end - run_start) / 2)
                .unwrap_or(0);
            let right = removable
                .iter()
                .find(|(run_start, _)| *run_start == end)
                .map(|(run_start, run_end)| (run_end - run_start) / 2)
                .unwrap_or(0);
            (start - padding.min(left), end + padding.min(right))
        })
        .collect();
    Ok(spans)
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

fn to_db(value: f32) -> f32 {
    if value <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * value.log10()
    }
}
