//! Sentence tokenizers.
//!
//! The segmenter never looks inside sentences. It consumes whatever ordered
//! sequence of sentences a [`SentenceTokenizer`] produces, so tokenization
//! strategies can be swapped without touching chunking.

use crate::io::unicode::split_sentences;
use unicode_segmentation::UnicodeSegmentation;

/// Trait for splitting text into an ordered sequence of sentences.
///
/// Implementations must be `Send + Sync` and deterministic: the same input
/// always yields the same sentences. Returned sentences are trimmed and
/// never empty.
///
/// # Examples
///
/// ```
/// use recap_rs::chunking::{PunctuationTokenizer, SentenceTokenizer};
///
/// let tokenizer = PunctuationTokenizer;
/// let sentences = tokenizer.tokenize("Hello there. How are you?");
/// assert_eq!(sentences, vec!["Hello there.", "How are you?"]);
/// ```
pub trait SentenceTokenizer: Send + Sync {
    /// Splits `text` into sentences, in order.
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Returns the name of the tokenizer.
    fn name(&self) -> &'static str;

    /// Returns a description of the tokenization strategy.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

/// Splits after `.`, `!` or `?` followed by whitespace.
///
/// Matches how caption transcripts are usually punctuated and keeps
/// decimals such as `2.5` intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationTokenizer;

impl SentenceTokenizer for PunctuationTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        split_sentences(text)
    }

    fn name(&self) -> &'static str {
        "punctuation"
    }

    fn description(&self) -> &'static str {
        "Splits after sentence punctuation followed by whitespace"
    }
}

/// Splits on Unicode (UAX #29) sentence boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceTokenizer;

impl SentenceTokenizer for UnicodeSentenceTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_sentence_bounds()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn name(&self) -> &'static str {
        "unicode"
    }

    fn description(&self) -> &'static str {
        "Unicode sentence boundaries (UAX #29) via unicode-segmentation"
    }
}
