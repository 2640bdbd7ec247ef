//! # recap-rs
//!
//! Summarization orchestration for long video transcripts.
//!
//! A transcript is split into sentence-aligned, overlapping chunks; the
//! chunks are summarized concurrently by a shared, lazily loaded model;
//! and the chunk summaries are merged, with one more pass when the merged
//! text is too long to read coherently.
//!
//! ## Features
//!
//! - **Segmentation**: Sentence-aligned chunks with configurable overlap
//! - **Bounded Concurrency**: Worker pool with order-preserving results
//! - **Model Lifecycle**: Lazy load, shared use, idle unload without races
//! - **Graceful Degradation**: Failed chunks become visible placeholders
//!
//! ## Example
//!
//! ```
//! use recap_rs::model::{ExtractiveBackend, ModelLifecycleManager};
//! use recap_rs::{SummaryConfig, summarize_transcript};
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! # rt.block_on(async {
//! let config = SummaryConfig::default();
//! let manager = ModelLifecycleManager::new(Arc::new(ExtractiveBackend::new()), config.lifecycle());
//!
//! let result = summarize_transcript(&manager, "First point. Second point.", &config)
//!     .await
//!     .unwrap();
//! assert_eq!(result.text, "First point. Second point.");
//! # });
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export configuration
pub use config::SummaryConfig;

// Re-export core domain types
pub use core::{Chunk, ChunkFailure, ChunkResult, SecondStage, SummaryResult, Transcript};

// Re-export chunking types
pub use chunking::{SentenceTokenizer, TranscriptSegmenter, available_tokenizers, create_tokenizer};

// Re-export model types
pub use model::{
    InferenceBackend, ModelLifecycleManager, ModelState, SummaryLength, available_backends,
    create_backend,
};

// Re-export pipeline types
pub use pipeline::{
    ChunkScheduler, SummaryAggregator, TranscriptSummarizer, summarize_transcript, target_lengths,
};

// Re-export transcript sources
pub use io::{DirectoryTranscriptSource, TranscriptSource};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
