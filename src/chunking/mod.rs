pub mod assembler;
pub mod dataset;
pub mod interpolate;
pub mod segments;

#[cfg(test)]
mod tests;

use crate::types::{Chunk, Fragment, Segment};

pub use assembler::{assemble, WordChunkAssembler};

/// How a source file is partitioned into chunks.
///
/// Selected explicitly per run; the variants are deliberately distinct
/// rather than unified, because they change the output chunk count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Fixed word count with explicit silence chunks for timeline gaps.
    /// Emits leading and trailing silence; the result tiles the whole file.
    FixedWordCountGapAware { words_per_chunk: usize },
    /// Fixed word count over fragments guaranteed contiguous by the
    /// upstream aligner; never synthesizes silence.
    FixedWordCountContiguous { words_per_chunk: usize },
    /// Consecutive fixed-length windows, transcript ignored.
    FixedDuration { window_ms: u64 },
    /// One chunk per recognizer segment (or aligner fragment).
    RecognizerSegment,
}

/// Apply a fragment-stream policy. `FixedDuration` has no fragment input
/// and is handled by the dataset chunker instead.
pub fn chunk_fragments(
    policy: ChunkPolicy,
    fragments: &[Fragment],
    total_duration_ms: Option<u64>,
) -> Vec<Chunk> {
    match policy {
        ChunkPolicy::FixedWordCountGapAware { words_per_chunk } => assemble(
            WordChunkAssembler::gap_aware(words_per_chunk),
            fragments,
            total_duration_ms,
        ),
        ChunkPolicy::FixedWordCountContiguous { words_per_chunk } => assemble(
            WordChunkAssembler::contiguous(words_per_chunk),
            fragments,
            total_duration_ms,
        ),
        ChunkPolicy::RecognizerSegment => {
            let segments: Vec<Segment> = fragments.iter().cloned().map(Segment::from).collect();
            segments::chunk_per_segment(&segments)
        }
        ChunkPolicy::FixedDuration { .. } => {
            unreachable!("fixed-duration windows are planned by the dataset chunker")
        }
    }
}
