use crate::text::{clean_caption_text, PLACEHOLDER_TEXT};

const MIN_SEGMENTS: usize = 5;
const MAX_SEGMENTS: usize = 8;
const WORDS_PER_SEGMENT_DIVISOR: usize = 10;
const DEGRADED_DIVISOR: usize = 5;
const MIN_USABLE_SEGMENTS: usize = 3;

/// A contiguous text span with its display interval, in seconds from the
/// start of narration.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionChunk {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Split narration text into caption chunks covering `[0, total_duration)`
/// with no gaps or overlaps. Timing is an even slice per chunk, not aligned
/// to actual speech.
pub fn segment_story(text: &str, total_duration: f64) -> Vec<CaptionChunk> {
    let cleaned = clean_caption_text(text);
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.is_empty() {
        words = PLACEHOLDER_TEXT.split_whitespace().collect();
    }

    let mut segments = group_words(&words);
    if segments.len() < MIN_USABLE_SEGMENTS {
        let per = (words.len() / DEGRADED_DIVISOR).max(1);
        segments = words
            .chunks(per)
            .map(|c| c.join(" "))
            .filter(|s| !s.trim().is_empty())
            .collect();
    }

    if segments.is_empty() {
        segments = vec![PLACEHOLDER_TEXT.to_string()];
    }

    assign_intervals(segments, total_duration)
}

/// Group words into roughly `clamp(words/10, 5, 8)` consecutive segments.
/// Any remainder folds into the final segment so the count never exceeds the
/// target.
fn group_words(words: &[&str]) -> Vec<String> {
    let target = (words.len() / WORDS_PER_SEGMENT_DIVISOR).clamp(MIN_SEGMENTS, MAX_SEGMENTS);
    let per = (words.len() / target).max(1);

    let mut segments: Vec<String> = words
        .chunks(per)
        .map(|c| c.join(" "))
        .filter(|s| !s.trim().is_empty())
        .collect();

    while segments.len() > target {
        let tail = segments.pop().expect("len > target implies non-empty");
        let last = segments.last_mut().expect("len still >= target");
        last.push(' ');
        last.push_str(&tail);
    }

    segments
}

/// Chunk `i` of `k` spans `[i*D/k, (i+1)*D/k)`; the final boundary is pinned
/// to `D` so the partition is exact.
fn assign_intervals(segments: Vec<String>, total_duration: f64) -> Vec<CaptionChunk> {
    let k = segments.len();
    let boundary = |i: usize| -> f64 {
        if i >= k {
            total_duration
        } else {
            total_duration * i as f64 / k as f64
        }
    };

    segments
        .into_iter()
        .enumerate()
        .map(|(i, text)| CaptionChunk {
            text,
            start: boundary(i),
            end: boundary(i + 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn assert_exact_partition(chunks: &[CaptionChunk], total: f64) {
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks.last().unwrap().end, total);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for chunk in chunks {
            assert!(chunk.end > chunk.start);
        }
    }

    #[test]
    fn forty_five_words_make_five_even_chunks() {
        let chunks = segment_story(&words(45), 30.0);
        assert_eq!(chunks.len(), 5);
        assert_exact_partition(&chunks, 30.0);
        for chunk in &chunks {
            assert!((chunk.end - chunk.start - 6.0).abs() < 1e-9);
        }
    }

    #[test]
    fn reasonable_text_stays_within_three_to_eight_chunks() {
        for n in [15, 20, 45, 60, 89, 120, 400] {
            let chunks = segment_story(&words(n), 42.0);
            assert!(
                (3..=8).contains(&chunks.len()),
                "{} words gave {} chunks",
                n,
                chunks.len()
            );
            assert_exact_partition(&chunks, 42.0);
        }
    }

    #[test]
    fn all_words_survive_segmentation() {
        let text = words(89);
        let chunks = segment_story(&text, 10.0);
        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn short_text_degrades_but_never_to_zero() {
        let chunks = segment_story("only two", 8.0);
        assert!(!chunks.is_empty());
        assert_exact_partition(&chunks, 8.0);
    }

    #[test]
    fn empty_text_uses_placeholder_words() {
        let chunks = segment_story("", 12.0);
        assert!(!chunks.is_empty());
        let all_text = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(all_text, PLACEHOLDER_TEXT);
        assert_exact_partition(&chunks, 12.0);
    }

    #[test]
    fn instruction_leakage_is_cleaned_before_segmentation() {
        let text = format!("{} NOTES: internal instructions follow", words(30));
        let chunks = segment_story(&text, 20.0);
        for chunk in &chunks {
            assert!(!chunk.text.contains("NOTES:"));
        }
    }
}
