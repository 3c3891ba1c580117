use crate::types::{Fragment, TimeInterval, WordToken};

/// Assign each word of a fragment an equal share of the fragment's interval.
///
/// Word `i` of `k` gets `[begin + i*d, begin + (i+1)*d)` with
/// `d = (end - begin) / k`. Boundaries are computed per index so adjacent
/// words share them exactly: the union of the returned intervals tiles the
/// fragment with no gap or overlap, whatever the rounding.
///
/// A fragment with no words returns an empty sequence; callers decide what a
/// wordless interval means (it is not an error here).
pub fn interpolate_words(fragment: &Fragment) -> Vec<WordToken> {
    let words: Vec<&str> = fragment.words().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let begin = fragment.interval.start_ms;
    let duration = fragment.interval.duration_ms();
    let count = words.len() as u64;

    let boundary = |i: u64| begin + (i * duration) / count;

    words
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            let i = i as u64;
            WordToken {
                interval: TimeInterval::new(boundary(i), boundary(i + 1)),
                text: word.to_string(),
            }
        })
        .collect()
}
