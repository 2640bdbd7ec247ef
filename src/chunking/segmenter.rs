//! Transcript segmentation.
//!
//! Packs tokenizer sentences into chunks of at most `max_chunk_words` words,
//! carrying the last `overlap_sentences` sentences of each chunk into the
//! next one for context. Sentences are never split, so a single sentence
//! longer than the limit becomes its own oversized chunk.

use crate::chunking::tokenizer::{PunctuationTokenizer, SentenceTokenizer};
use crate::chunking::{DEFAULT_MAX_CHUNK_WORDS, DEFAULT_OVERLAP_SENTENCES};
use crate::core::Chunk;
use crate::error::{ChunkingError, Result};
use crate::io::unicode::word_count;

/// Splits transcripts into ordered, overlapping, sentence-aligned chunks.
///
/// # Examples
///
/// ```
/// use recap_rs::chunking::TranscriptSegmenter;
///
/// let segmenter = TranscriptSegmenter::new(5, 1).unwrap();
/// let chunks = segmenter.segment("One two three. Four five. Six seven eight.");
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].text, "One two three. Four five.");
/// // The last sentence of chunk 0 is carried into chunk 1
/// assert_eq!(chunks[1].text, "Four five. Six seven eight.");
/// ```
pub struct TranscriptSegmenter {
    tokenizer: Box<dyn SentenceTokenizer>,
    max_chunk_words: usize,
    overlap_sentences: usize,
}

impl std::fmt::Debug for TranscriptSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptSegmenter")
            .field("tokenizer", &self.tokenizer.name())
            .field("max_chunk_words", &self.max_chunk_words)
            .field("overlap_sentences", &self.overlap_sentences)
            .finish()
    }
}

impl Default for TranscriptSegmenter {
    fn default() -> Self {
        Self {
            tokenizer: Box::new(PunctuationTokenizer),
            max_chunk_words: DEFAULT_MAX_CHUNK_WORDS,
            overlap_sentences: DEFAULT_OVERLAP_SENTENCES,
        }
    }
}

impl TranscriptSegmenter {
    /// Creates a segmenter using the punctuation tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::InvalidConfig`] if `max_chunk_words` is zero.
    pub fn new(max_chunk_words: usize, overlap_sentences: usize) -> Result<Self> {
        Self::with_tokenizer(
            Box::new(PunctuationTokenizer),
            max_chunk_words,
            overlap_sentences,
        )
    }

    /// Creates a segmenter with a specific tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::InvalidConfig`] if `max_chunk_words` is zero.
    pub fn with_tokenizer(
        tokenizer: Box<dyn SentenceTokenizer>,
        max_chunk_words: usize,
        overlap_sentences: usize,
    ) -> Result<Self> {
        if max_chunk_words == 0 {
            return Err(ChunkingError::InvalidConfig {
                reason: "max_chunk_words must be > 0".to_string(),
            }
            .into());
        }
        Ok(Self {
            tokenizer,
            max_chunk_words,
            overlap_sentences,
        })
    }

    /// Returns the tokenizer name.
    #[must_use]
    pub fn tokenizer_name(&self) -> &'static str {
        self.tokenizer.name()
    }

    /// Splits `text` into chunks. Empty text yields no chunks.
    #[must_use]
    pub fn segment(&self, text: &str) -> Vec<Chunk> {
        let sentences = self.tokenizer.tokenize(text);
        segment_sentences(&sentences, self.max_chunk_words, self.overlap_sentences)
    }
}

/// Packs an ordered sentence sequence into chunks.
///
/// A chunk is flushed when the next sentence would push it past
/// `max_chunk_words` and it holds at least one sentence that was not carried
/// over. The carried-over seed is trimmed from the front until it fits
/// together with the next sentence, so overlap never forces an extra flush.
///
/// Chunk indices are dense, and the fresh (non-overlap) sentences of the
/// returned chunks cover `sentences` exactly once, in order.
#[must_use]
pub fn segment_sentences<S: AsRef<str>>(
    sentences: &[S],
    max_chunk_words: usize,
    overlap_sentences: usize,
) -> Vec<Chunk> {
    let counts: Vec<usize> = sentences.iter().map(|s| word_count(s.as_ref())).collect();

    let mut chunks = Vec::new();
    // Buffer is always the contiguous sentence range start..end
    let mut start = 0;
    let mut carried = 0;
    let mut words = 0;

    for (end, &next_words) in counts.iter().enumerate() {
        let fresh = end - start - carried;
        if fresh > 0 && words + next_words > max_chunk_words {
            chunks.push(Chunk::from_sentences(
                chunks.len(),
                &sentences[start..end],
                start..end,
                carried,
            ));

            let mut seed_start = end - overlap_sentences.min(end - start);
            let mut seed_words: usize = counts[seed_start..end].iter().sum();
            while seed_start < end && seed_words + next_words > max_chunk_words {
                seed_words -= counts[seed_start];
                seed_start += 1;
            }

            start = seed_start;
            carried = end - seed_start;
            words = seed_words;
        }
        words += next_words;
    }

    let end = sentences.len();
    if end > start + carried {
        chunks.push(Chunk::from_sentences(
            chunks.len(),
            &sentences[start..end],
            start..end,
            carried,
        ));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::tokenizer::UnicodeSentenceTokenizer;

    #[test]
    fn test_segment_empty_text() {
        let segmenter = TranscriptSegmenter::default();
        assert!(segmenter.segment("").is_empty());
        assert!(segmenter.segment("   ").is_empty());
    }

    #[test]
    fn test_segment_small_text_single_chunk() {
        let segmenter = TranscriptSegmenter::new(100, 1).unwrap();
        let chunks = segmenter.segment("A. B. C.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A. B. C.");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].word_count, 3);
        assert!(!chunks[0].has_overlap());
    }

    #[test]
    fn test_segment_zero_max_words_rejected() {
        assert!(TranscriptSegmenter::new(0, 1).is_err());
    }

    #[test]
    fn test_segment_without_overlap() {
        let sentences = ["a b.", "c d.", "e f.", "g h."];
        let chunks = segment_sentences(&sentences, 4, 0);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a b. c d.");
        assert_eq!(chunks[1].text, "e f. g h.");
        assert_eq!(chunks[1].sentence_range, 2..4);
    }

    #[test]
    fn test_segment_with_overlap_carries_trailing_sentences() {
        let sentences = ["a b.", "c d.", "e f.", "g h.", "i j."];
        let chunks = segment_sentences(&sentences, 6, 1);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a b. c d. e f.");
        assert_eq!(chunks[1].text, "e f. g h. i j.");
        assert_eq!(chunks[1].overlap_sentences, 1);
        assert_eq!(chunks[1].fresh_sentence_range(), 3..5);
    }

    #[test]
    fn test_oversized_sentence_is_its_own_chunk() {
        let long = "word ".repeat(50);
        let long = format!("{} end.", long.trim_end());
        let sentences = vec!["Short one.".to_string(), long.clone(), "Tail here.".to_string()];
        let chunks = segment_sentences(&sentences, 10, 1);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, long);
        assert_eq!(chunks[1].word_count, 51);
        // Overlap that doesn't fit next to the oversized sentence is dropped
        assert!(!chunks[1].has_overlap());
        assert!(!chunks[2].has_overlap());
    }

    #[test]
    fn test_single_oversized_sentence_not_truncated() {
        let text = format!("{}.", "lorem ".repeat(30).trim_end());
        let segmenter = TranscriptSegmenter::new(5, 2).unwrap();
        let chunks = segmenter.segment(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].word_count, 30);
    }

    #[test]
    fn test_overlap_larger_than_chunk_makes_progress() {
        let sentences = ["a.", "b.", "c.", "d.", "e."];
        let chunks = segment_sentences(&sentences, 2, 10);
        // Every chunk has at least one fresh sentence, so the loop terminates
        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            assert!(chunk.sentence_count() > chunk.overlap_sentences);
            assert!(chunk.word_count <= 2);
        }
    }

    #[test]
    fn test_indices_are_dense() {
        let text = "One. Two. Three. Four. Five. Six. Seven. Eight.";
        let segmenter = TranscriptSegmenter::new(2, 1).unwrap();
        let chunks = segmenter.segment(text);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_segment_with_unicode_tokenizer() {
        let segmenter =
            TranscriptSegmenter::with_tokenizer(Box::new(UnicodeSentenceTokenizer), 4, 0).unwrap();
        let chunks = segmenter.segment("Hello 世界. This is a test. Another sentence here.");
        assert_eq!(segmenter.tokenizer_name(), "unicode");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "Hello 世界.");
    }

    #[test]
    fn test_segment_is_deterministic() {
        let text = "Alpha beta. Gamma delta epsilon. Zeta. Eta theta iota kappa. Lambda.";
        let segmenter = TranscriptSegmenter::new(4, 1).unwrap();
        assert_eq!(segmenter.segment(text), segmenter.segment(text));
    }
}
