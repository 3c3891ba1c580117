use crate::types::{Chunk, Segment};
use tracing::warn;

/// One chunk per source unit: segment boundaries become chunk boundaries,
/// segment text becomes chunk text, no interpolation.
pub fn chunk_per_segment(segments: &[Segment]) -> Vec<Chunk> {
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| Chunk {
            index: i as u32 + 1,
            interval: segment.interval,
            text: segment.text.trim().to_string(),
        })
        .collect()
}

/// Group transcript words into fixed-size buckets and time each bucket from
/// recognizer segment boundaries.
///
/// Timing here is coarse: a bucket gets the start of the first segment whose
/// word range it touches and the end of the last, nothing finer. Word-level
/// interpolation over alignment fragments gives tighter intervals when a
/// transcript can be force-aligned instead.
///
/// A bucket no segment overlaps is dropped with a warning; its grid
/// position is skipped so surviving buckets keep their positional index.
/// Timing is never guessed for it.
pub fn rebucket_transcript_words(
    transcript: &str,
    segments: &[Segment],
    words_per_chunk: usize,
) -> Vec<Chunk> {
    assert!(words_per_chunk > 0, "words_per_chunk must be positive");

    let words: Vec<&str> = transcript.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    // Each segment covers a half-open range of the recognizer's own word
    // stream; buckets are matched against those ranges.
    let mut ranges = Vec::with_capacity(segments.len());
    let mut cursor = 0usize;
    for segment in segments {
        let count = segment.text.split_whitespace().count();
        ranges.push((cursor, cursor + count));
        cursor += count;
    }

    let bucket_count = words.len().div_ceil(words_per_chunk);
    let mut chunks = Vec::with_capacity(bucket_count);

    for bucket in 0..bucket_count {
        let first = bucket * words_per_chunk;
        let last = (first + words_per_chunk).min(words.len());

        let mut matched = segments
            .iter()
            .zip(&ranges)
            .filter(|(_, (range_first, range_last))| *range_first < last && *range_last > first)
            .map(|(segment, _)| segment.interval);

        let Some(head) = matched.next() else {
            warn!(
                bucket = bucket + 1,
                "no recognizer segment overlaps this word range; dropping chunk"
            );
            continue;
        };
        let tail = matched.last().unwrap_or(head);

        chunks.push(Chunk {
            index: bucket as u32 + 1,
            interval: crate::types::TimeInterval::new(head.start_ms, tail.end_ms),
            text: words[first..last].join(" "),
        });
    }

    chunks
}
