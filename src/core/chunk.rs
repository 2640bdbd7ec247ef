//! Chunk representation for recap-rs.
//!
//! Chunks are sentence-aligned spans of a transcript produced by the
//! segmenter. Each chunk remembers which tokenizer sentences it covers and
//! how many of its leading sentences were carried over from the previous
//! chunk, so the designed overlap can always be removed exactly.

use crate::io::unicode::word_count;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A bounded, possibly overlapping span of transcript text.
///
/// Indices are dense and contiguous (`0..n`) in transcript order.
///
/// # Examples
///
/// ```
/// use recap_rs::core::Chunk;
///
/// let chunk = Chunk::from_sentences(0, &["Hello there.", "General Kenobi."], 0..2, 0);
/// assert_eq!(chunk.text, "Hello there. General Kenobi.");
/// assert_eq!(chunk.word_count, 4);
/// assert!(!chunk.has_overlap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequential index within the transcript (0-based).
    pub index: usize,

    /// Chunk text: its sentences joined by a single space.
    pub text: String,

    /// Whitespace-separated word count of `text`.
    pub word_count: usize,

    /// Range of tokenizer sentences covered by this chunk.
    pub sentence_range: Range<usize>,

    /// Number of leading sentences duplicated from the previous chunk.
    pub overlap_sentences: usize,
}

impl Chunk {
    /// Creates a chunk from its sentences.
    ///
    /// # Arguments
    ///
    /// * `index` - Sequential index within the transcript.
    /// * `sentences` - The sentences making up the chunk, in order.
    /// * `sentence_range` - Position of those sentences in the tokenizer output.
    /// * `overlap_sentences` - How many leading sentences were carried over.
    #[must_use]
    pub fn from_sentences<S: AsRef<str>>(
        index: usize,
        sentences: &[S],
        sentence_range: Range<usize>,
        overlap_sentences: usize,
    ) -> Self {
        let text = sentences
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        let word_count = word_count(&text);
        Self {
            index,
            text,
            word_count,
            sentence_range,
            overlap_sentences,
        }
    }

    /// Returns the number of sentences in the chunk.
    #[must_use]
    pub const fn sentence_count(&self) -> usize {
        self.sentence_range.end - self.sentence_range.start
    }

    /// Returns the range of sentences that are new in this chunk.
    #[must_use]
    pub const fn fresh_sentence_range(&self) -> Range<usize> {
        (self.sentence_range.start + self.overlap_sentences)..self.sentence_range.end
    }

    /// Whether this chunk starts with sentences carried over from the previous one.
    #[must_use]
    pub const fn has_overlap(&self) -> bool {
        self.overlap_sentences > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_from_sentences() {
        let chunk = Chunk::from_sentences(3, &["One two.", "Three four five."], 4..6, 1);
        assert_eq!(chunk.index, 3);
        assert_eq!(chunk.text, "One two. Three four five.");
        assert_eq!(chunk.word_count, 5);
        assert_eq!(chunk.sentence_count(), 2);
        assert_eq!(chunk.fresh_sentence_range(), 5..6);
        assert!(chunk.has_overlap());
    }

    #[test]
    fn test_chunk_empty() {
        let chunk = Chunk::from_sentences::<&str>(0, &[], 0..0, 0);
        assert!(chunk.text.is_empty());
        assert_eq!(chunk.word_count, 0);
        assert_eq!(chunk.sentence_count(), 0);
    }

    #[test]
    fn test_chunk_serialization() {
        let chunk = Chunk::from_sentences(1, &["A b c."], 2..3, 0);
        let json = serde_json::to_string(&chunk).unwrap();
        let back: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(chunk, back);
    }
}
