//! I/O utilities for recap-rs.
//!
//! Provides transcript file reading with memory mapping for large inputs,
//! the directory-backed transcript source, and Unicode text helpers.

pub mod reader;
pub mod source;
pub mod unicode;

pub use reader::{FileReader, read_file, read_input, write_chunks, write_file};
pub use source::{DirectoryTranscriptSource, TranscriptSource, validate_video_id};
pub use unicode::{split_sentences, word_count};
