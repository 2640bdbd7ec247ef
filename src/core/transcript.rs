//! Transcript input.
//!
//! Caption transcripts arrive as many short fragments separated by line
//! breaks and uneven spacing. A [`Transcript`] normalizes all whitespace runs
//! to single spaces once, at construction, and is immutable afterwards.

use crate::error::{InputError, Result};
use crate::io::unicode::word_count;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// Raw transcript text, normalized and immutable.
///
/// # Examples
///
/// ```
/// use recap_rs::core::Transcript;
///
/// let transcript = Transcript::new("  hello\nthere \n\n general  kenobi ");
/// assert_eq!(transcript.as_str(), "hello there general kenobi");
/// assert_eq!(transcript.word_count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    /// Creates a transcript, collapsing whitespace runs and trimming.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let text = WHITESPACE_RUN.as_ref().map_or_else(
            || trimmed.split_whitespace().collect::<Vec<_>>().join(" "),
            |re| re.replace_all(trimmed, " ").into_owned(),
        );
        Self { text }
    }

    /// Creates a transcript, rejecting text that cannot be a transcript.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidTranscript`] if `raw` contains NUL
    /// bytes, which only binary input carries.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains('\0') {
            return Err(InputError::InvalidTranscript {
                reason: "contains NUL bytes; binary input?".to_string(),
            }
            .into());
        }
        Ok(Self::new(raw))
    }

    /// Returns the normalized text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` if the transcript has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the whitespace-separated word count.
    #[must_use]
    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

impl AsRef<str> for Transcript {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_normalizes_whitespace() {
        let t = Transcript::new("one\ttwo\r\nthree   four");
        assert_eq!(t.as_str(), "one two three four");
    }

    #[test]
    fn test_transcript_whitespace_only_is_empty() {
        assert!(Transcript::new(" \n\t ").is_empty());
        assert!(Transcript::new("").is_empty());
    }

    #[test]
    fn test_transcript_parse_rejects_nul() {
        let err = Transcript::parse("caption\0text").unwrap_err();
        assert!(err.is_input_error());
        assert_eq!(Transcript::parse(" a  b ").unwrap().as_str(), "a b");
    }
}
