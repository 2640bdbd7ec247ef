//! Unicode utilities for text processing.
//!
//! Word counting and grapheme-safe truncation, plus the punctuation-based
//! sentence splitting used by the default tokenizer.

use unicode_segmentation::UnicodeSegmentation;

/// Counts whitespace-separated words.
///
/// # Examples
///
/// ```
/// use recap_rs::io::unicode::word_count;
///
/// assert_eq!(word_count("  so today we   talk "), 4);
/// assert_eq!(word_count(""), 0);
/// ```
#[must_use]
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Truncates a string at a grapheme cluster boundary.
///
/// # Arguments
///
/// * `s` - The string to truncate.
/// * `max_graphemes` - Maximum number of grapheme clusters.
///
/// # Returns
///
/// A string slice containing at most `max_graphemes` grapheme clusters.
#[must_use]
pub fn truncate_graphemes(s: &str, max_graphemes: usize) -> &str {
    let mut end_byte = 0;

    for (count, grapheme) in s.graphemes(true).enumerate() {
        if count >= max_graphemes {
            break;
        }
        end_byte += grapheme.len();
    }

    &s[..end_byte]
}

/// Splits text into sentences (approximate).
///
/// Splits after `.`, `!`, `?` when followed by whitespace or the end of the
/// text. Sentences are trimmed; empty sentences are dropped.
///
/// # Arguments
///
/// * `s` - The string to split.
///
/// # Returns
///
/// Vector of sentence strings.
#[must_use]
pub fn split_sentences(s: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if matches!(c, b'.' | b'!' | b'?') {
            // Check if followed by whitespace or end
            if i + 1 >= bytes.len() || bytes[i + 1].is_ascii_whitespace() {
                let sentence = s[start..=i].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                // Skip whitespace
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                start = i;
                continue;
            }
        }
        i += 1;
    }

    // Add remaining text
    if start < s.len() {
        let rest = s[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
    }

    sentences
}
