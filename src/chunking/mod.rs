//! Transcript chunking for recap-rs.
//!
//! Splits transcripts into sentence-aligned, overlapping chunks sized for a
//! single summarization call. Two pieces cooperate:
//!
//! - **Tokenizers**: split text into an ordered sequence of sentences
//! - **Segmenter**: packs sentences into word-bounded chunks with overlap

pub mod segmenter;
pub mod tokenizer;

pub use segmenter::{TranscriptSegmenter, segment_sentences};
pub use tokenizer::{PunctuationTokenizer, SentenceTokenizer, UnicodeSentenceTokenizer};

/// Default maximum words per chunk.
pub const DEFAULT_MAX_CHUNK_WORDS: usize = 400;

/// Default number of sentences carried into the next chunk.
pub const DEFAULT_OVERLAP_SENTENCES: usize = 1;

/// Creates a sentence tokenizer by name.
///
/// # Arguments
///
/// * `name` - Tokenizer name: "punctuation" or "unicode" (case-insensitive).
///
/// # Errors
///
/// Returns [`crate::error::ChunkingError::UnknownTokenizer`] if the name is not recognized.
pub fn create_tokenizer(name: &str) -> crate::error::Result<Box<dyn SentenceTokenizer>> {
    match name.to_lowercase().as_str() {
        "punctuation" => Ok(Box::new(PunctuationTokenizer)),
        "unicode" => Ok(Box::new(UnicodeSentenceTokenizer)),
        _ => Err(crate::error::ChunkingError::UnknownTokenizer {
            name: name.to_string(),
        }
        .into()),
    }
}

/// Lists available tokenizer names.
#[must_use]
pub fn available_tokenizers() -> Vec<&'static str> {
    vec!["punctuation", "unicode"]
}
