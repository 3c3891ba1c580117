use super::assembler::{assemble, WordChunkAssembler};
use crate::types::{Chunk, Fragment, TimeInterval};

fn fragment(start_ms: u64, end_ms: u64, text: &str) -> Fragment {
    Fragment::new(TimeInterval::new(start_ms, end_ms), text)
}

/// The central invariant of the gap-aware policy: chunks sorted by start
/// tile `[0, total)` with no gap and no overlap, and indices follow
/// timeline order.
fn assert_tiles_timeline(chunks: &[Chunk], total_ms: u64) {
    assert!(!chunks.is_empty(), "expected at least one chunk");
    let mut cursor = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(
            chunk.interval.start_ms, cursor,
            "chunk {} does not continue the timeline",
            chunk.index
        );
        assert_eq!(chunk.index, i as u32 + 1, "indices must be dense and 1-based");
        cursor = chunk.interval.end_ms;
    }
    assert_eq!(cursor, total_ms, "chunks must cover the full duration");
}

#[test]
fn gap_becomes_silence_chunk_between_word_chunks() {
    // Two-word chunks over fragments [(0,2,"a b"), (5,6,"c")] in a 6s file
    let fragments = vec![fragment(0, 2_000, "a b"), fragment(5_000, 6_000, "c")];
    let chunks = assemble(WordChunkAssembler::gap_aware(2), &fragments, Some(6_000));

    let summary: Vec<(u64, u64, &str)> = chunks
        .iter()
        .map(|c| (c.interval.start_ms, c.interval.end_ms, c.text.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, 2_000, "a b"),
            (2_000, 5_000, ""),
            (5_000, 6_000, "c"),
        ]
    );
    assert_tiles_timeline(&chunks, 6_000);
}

#[test]
fn gap_aware_tiles_with_leading_and_trailing_silence() {
    let fragments = vec![
        fragment(1_000, 3_000, "one two three four"),
        fragment(3_000, 4_000, "five"),
        fragment(6_500, 8_000, "six seven"),
    ];
    let chunks = assemble(WordChunkAssembler::gap_aware(4), &fragments, Some(10_000));

    assert_tiles_timeline(&chunks, 10_000);
    // Leading gap, four words, remainder flushed before the 4s..6.5s gap,
    // the gap itself, the last two words, trailing silence
    assert!(chunks[0].is_silence());
    assert_eq!(chunks[0].interval, TimeInterval::new(0, 1_000));
    assert!(chunks.last().unwrap().is_silence());
    assert_eq!(chunks.last().unwrap().interval, TimeInterval::new(8_000, 10_000));

    let text: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(text, vec!["", "one two three four", "five", "", "six seven", ""]);
}

#[test]
fn buffer_flushes_before_silence_so_chunks_stay_ordered() {
    // One buffered word followed by a gap: the word must be emitted before
    // the silence chunk, not merged across it later
    let fragments = vec![fragment(0, 1_000, "alpha"), fragment(3_000, 4_000, "beta gamma")];
    let chunks = assemble(WordChunkAssembler::gap_aware(2), &fragments, Some(4_000));

    assert_tiles_timeline(&chunks, 4_000);
    let text: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(text, vec!["alpha", "", "beta gamma"]);
}

#[test]
fn empty_fragment_yields_exactly_one_silence_chunk() {
    let fragments = vec![
        fragment(0, 1_000, "words here"),
        fragment(1_000, 2_500, "   "),
        fragment(2_500, 3_500, "more words"),
    ];
    let chunks = assemble(WordChunkAssembler::gap_aware(2), &fragments, Some(3_500));

    assert_tiles_timeline(&chunks, 3_500);
    assert_eq!(chunks.len(), 3);
    assert!(chunks[1].is_silence());
    assert_eq!(chunks[1].interval, TimeInterval::new(1_000, 2_500));
    // No stale text leaks into the silence chunk
    assert_eq!(chunks[2].text, "more words");
}

#[test]
fn contiguous_variant_never_emits_silence() {
    // Same stream with a gap: the contiguous variant trusts the upstream
    // contract and emits word chunks only
    let fragments = vec![fragment(0, 2_000, "a b"), fragment(5_000, 6_000, "c")];
    let chunks = assemble(WordChunkAssembler::contiguous(2), &fragments, Some(6_000));

    let text: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(text, vec!["a b", "c"]);
    assert!(chunks.iter().all(|c| !c.is_silence()));
}

#[test]
fn contiguous_variant_still_reports_wordless_fragments() {
    let fragments = vec![fragment(0, 1_000, "a"), fragment(1_000, 2_000, "")];
    let chunks = assemble(WordChunkAssembler::contiguous(3), &fragments, None);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "a");
    assert!(chunks[1].is_silence());
    assert_eq!(chunks[1].interval, TimeInterval::new(1_000, 2_000));
}

#[test]
fn words_group_across_fragment_boundaries() {
    let fragments = vec![
        fragment(0, 1_500, "one two three"),
        fragment(1_500, 3_000, "four five six"),
    ];
    let chunks = assemble(WordChunkAssembler::contiguous(4), &fragments, None);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "one two three four");
    assert_eq!(chunks[0].interval, TimeInterval::new(0, 2_000));
    assert_eq!(chunks[1].text, "five six");
    assert_eq!(chunks[1].interval, TimeInterval::new(2_000, 3_000));
}

#[test]
fn chunk_interval_spans_first_to_last_buffered_word() {
    let fragments = vec![fragment(400, 1_000, "a b c")];
    let chunks = assemble(WordChunkAssembler::contiguous(3), &fragments, None);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].interval, TimeInterval::new(400, 1_000));
}

#[test]
fn no_fragments_gap_aware_emits_single_silence_for_whole_file() {
    let chunks = assemble(WordChunkAssembler::gap_aware(5), &[], Some(2_000));
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_silence());
    assert_tiles_timeline(&chunks, 2_000);
}

#[test]
fn no_fragments_contiguous_emits_nothing() {
    let chunks = assemble(WordChunkAssembler::contiguous(5), &[], None);
    assert!(chunks.is_empty());
}
