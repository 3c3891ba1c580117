use crate::types::{Chunk, Fragment, TimeInterval, WordToken};

use super::interpolate::interpolate_words;

/// State machine that groups a fragment stream into word-count chunks.
///
/// The gap-aware variant models the full source timeline: gaps between
/// fragments, a gap before the first fragment, and trailing audio after the
/// last one all become explicit silence chunks, so the emitted chunks
/// partition `[0, total_duration)` exactly. The contiguous variant trusts the
/// upstream tool's contiguity guarantee and never synthesizes silence.
///
/// The two variants intentionally stay separate behaviors behind one type:
/// applying the gap-aware one to contiguous input only adds dead branches,
/// while omitting it where gaps exist silently loses silence regions.
pub struct WordChunkAssembler {
    words_per_chunk: usize,
    gap_aware: bool,
    buffer: Vec<WordToken>,
    prev_end_ms: u64,
    next_index: u32,
}

impl WordChunkAssembler {
    /// Variant for fragment streams that may contain timeline gaps.
    pub fn gap_aware(words_per_chunk: usize) -> Self {
        Self::new(words_per_chunk, true)
    }

    /// Variant for contiguous fragment streams (forced alignment over a
    /// full transcript).
    pub fn contiguous(words_per_chunk: usize) -> Self {
        Self::new(words_per_chunk, false)
    }

    fn new(words_per_chunk: usize, gap_aware: bool) -> Self {
        assert!(words_per_chunk > 0, "words_per_chunk must be positive");
        Self {
            words_per_chunk,
            gap_aware,
            buffer: Vec::new(),
            prev_end_ms: 0,
            next_index: 1,
        }
    }

    /// Feed the next fragment, in arrival order; returns chunks completed
    /// by it.
    ///
    /// Overlapping fragments (a violated upstream contract) move the cursor
    /// to `fragment.end` regardless and produce overlapping chunks; nothing
    /// is clipped or repaired.
    pub fn advance(&mut self, fragment: &Fragment) -> Vec<Chunk> {
        let mut emitted = Vec::new();

        if self.gap_aware && fragment.interval.start_ms > self.prev_end_ms {
            // Pending words must not span backwards over the silence chunk
            self.flush_buffer(&mut emitted);
            let gap = TimeInterval::new(self.prev_end_ms, fragment.interval.start_ms);
            self.emit(&mut emitted, gap, String::new());
        }

        let words = interpolate_words(fragment);
        if words.is_empty() {
            // Aligned to silence or punctuation-only content
            self.flush_buffer(&mut emitted);
            self.emit(&mut emitted, fragment.interval, String::new());
            self.prev_end_ms = fragment.interval.end_ms;
            return emitted;
        }

        for word in words {
            self.buffer.push(word);
            if self.buffer.len() == self.words_per_chunk {
                self.flush_buffer(&mut emitted);
            }
        }

        self.prev_end_ms = fragment.interval.end_ms;
        emitted
    }

    /// End of the fragment stream: emit any short remainder, and in the
    /// gap-aware variant a trailing silence chunk up to `total_duration_ms`.
    pub fn finish(mut self, total_duration_ms: Option<u64>) -> Vec<Chunk> {
        let mut emitted = Vec::new();
        self.flush_buffer(&mut emitted);

        if self.gap_aware {
            if let Some(total) = total_duration_ms {
                if self.prev_end_ms < total {
                    let tail = TimeInterval::new(self.prev_end_ms, total);
                    self.emit(&mut emitted, tail, String::new());
                }
            }
        }

        emitted
    }

    fn flush_buffer(&mut self, out: &mut Vec<Chunk>) {
        if self.buffer.is_empty() {
            return;
        }
        let interval = TimeInterval::new(
            self.buffer.first().map(|w| w.interval.start_ms).unwrap_or(0),
            self.buffer.last().map(|w| w.interval.end_ms).unwrap_or(0),
        );
        let text = self
            .buffer
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        self.buffer.clear();
        self.emit(out, interval, text);
    }

    fn emit(&mut self, out: &mut Vec<Chunk>, interval: TimeInterval, text: String) {
        out.push(Chunk {
            index: self.next_index,
            interval,
            text,
        });
        self.next_index += 1;
    }
}

/// Run a whole fragment stream through an assembler in one call.
pub fn assemble(
    mut assembler: WordChunkAssembler,
    fragments: &[Fragment],
    total_duration_ms: Option<u64>,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for fragment in fragments {
        chunks.extend(assembler.advance(fragment));
    }
    chunks.extend(assembler.finish(total_duration_ms));
    chunks
}
