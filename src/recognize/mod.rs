//! Speech-recognition segment source.
//!
//! The recognizer contract is narrow: a uniform in-memory waveform goes in,
//! an ordered list of time-stamped segments comes out. Remote object
//! references are resolved by the caller (download, then decode) before the
//! waveform reaches this seam.

use crate::types::{AudioData, Segment};
use anyhow::Result;

/// Produces time-stamped recognition segments for a waveform.
pub trait Recognizer {
    fn recognize(&self, audio: &AudioData) -> Result<Vec<Segment>>;
}

/// Join segment texts into the flat transcript form of the contract.
pub fn transcript_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(feature = "whisper")]
pub use whisper::WhisperRecognizer;

#[cfg(feature = "whisper")]
mod whisper {
    use super::Recognizer;
    use crate::audio::resample::resample;
    use crate::types::{AudioData, Segment, TimeInterval};
    use anyhow::{Context, Result};
    use std::path::Path;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Whisper expects 16 kHz input.
    const WHISPER_SAMPLE_RATE: u32 = 16_000;

    /// Local whisper.cpp model wrapped behind the [`Recognizer`] seam.
    pub struct WhisperRecognizer {
        ctx: WhisperContext,
    }

    impl WhisperRecognizer {
        pub fn from_model_path<P: AsRef<Path>>(model_path: P) -> Result<Self> {
            let model_path = model_path.as_ref();
            let ctx = WhisperContext::new_with_params(
                &model_path.to_string_lossy(),
                WhisperContextParameters::default(),
            )
            .with_context(|| {
                format!("Failed to load Whisper model at {}", model_path.display())
            })?;
            Ok(Self { ctx })
        }
    }

    impl Recognizer for WhisperRecognizer {
        fn recognize(&self, audio: &AudioData) -> Result<Vec<Segment>> {
            let normalized;
            let source = if audio.sample_rate == WHISPER_SAMPLE_RATE {
                audio
            } else {
                normalized = resample(audio, WHISPER_SAMPLE_RATE)?;
                &normalized
            };

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_print_special(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            let mut state = self
                .ctx
                .create_state()
                .context("Failed to create Whisper state")?;
            state
                .full(params, &source.samples)
                .context("Failed to transcribe audio")?;

            let mut segments = Vec::new();
            for segment in state.as_iter() {
                let text = segment
                    .to_str()
                    .context("Failed to get segment text")?
                    .trim()
                    .to_string();

                // Timestamps arrive in centiseconds
                let start_ms = segment.start_timestamp().max(0) as u64 * 10;
                let end_ms = segment.end_timestamp().max(0) as u64 * 10;
                segments.push(Segment {
                    interval: TimeInterval::new(start_ms, end_ms.max(start_ms)),
                    text,
                });
            }

            Ok(segments)
        }
    }
}
