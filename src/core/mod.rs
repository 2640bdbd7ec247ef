//! Core domain models for recap-rs.
//!
//! This module contains the data structures that flow through the
//! summarization pipeline: transcripts, chunks, per-chunk results, and the
//! final summary. These are pure domain models with no I/O dependencies.

pub mod chunk;
pub mod summary;
pub mod transcript;

pub use chunk::Chunk;
pub use summary::{ChunkFailure, ChunkResult, SecondStage, SummaryResult};
pub use transcript::Transcript;
