//! The summarization pipeline.
//!
//! ```text
//! raw text -> Transcript -> TranscriptSegmenter -> ChunkScheduler -> SummaryAggregator -> SummaryResult
//!                                                       \__________ ModelLifecycleManager ______/
//! ```
//!
//! [`TranscriptSummarizer`] wires the stages together for one
//! configuration; the model manager is shared and may serve many
//! summarizers at once.

pub mod aggregator;
pub mod scheduler;

pub use aggregator::{Aggregate, AggregatorConfig, SummaryAggregator};
pub use scheduler::{ChunkScheduler, DEFAULT_WORKER_LIMIT, SchedulerConfig, target_lengths};

use crate::chunking::TranscriptSegmenter;
use crate::config::SummaryConfig;
use crate::core::{SummaryResult, Transcript};
use crate::error::{InputError, Result};
use crate::model::ModelLifecycleManager;
use tokio::time::Instant;

/// Summarizes whole transcripts.
///
/// # Examples
///
/// ```
/// use recap_rs::model::{ExtractiveBackend, ModelLifecycleManager};
/// use recap_rs::{SummaryConfig, TranscriptSummarizer};
/// use std::sync::Arc;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// # rt.block_on(async {
/// let config = SummaryConfig::default();
/// let manager = ModelLifecycleManager::new(Arc::new(ExtractiveBackend::new()), config.lifecycle());
/// let summarizer = TranscriptSummarizer::new(manager, &config).unwrap();
///
/// let result = summarizer
///     .summarize_transcript("Rust is a systems language. It is fast and memory safe.")
///     .await
///     .unwrap();
/// assert_eq!(result.chunk_diagnostics.len(), 1);
/// assert!(!result.is_degraded());
/// # });
/// ```
#[derive(Debug)]
pub struct TranscriptSummarizer {
    manager: ModelLifecycleManager,
    segmenter: TranscriptSegmenter,
    scheduler: ChunkScheduler,
    aggregator: SummaryAggregator,
}

impl TranscriptSummarizer {
    /// Creates a summarizer that runs inference through `manager`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if `config` is invalid.
    pub fn new(manager: ModelLifecycleManager, config: &SummaryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            segmenter: config.segmenter()?,
            scheduler: ChunkScheduler::new(manager.clone(), config.scheduler()),
            aggregator: SummaryAggregator::new(manager.clone(), config.aggregator()),
            manager,
        })
    }

    /// Returns the model manager.
    #[must_use]
    pub const fn manager(&self) -> &ModelLifecycleManager {
        &self.manager
    }

    /// Produces a summary of `raw_text`.
    ///
    /// Chunk-level failures degrade the result instead of failing it; see
    /// [`SummaryResult::chunk_diagnostics`].
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyTranscript`] if the text holds no
    /// sentences, [`InputError::InvalidTranscript`] if it is not text, or [`crate::error::ModelError::LoadFailed`] if the model
    /// cannot be loaded.
    #[tracing::instrument(skip_all, fields(bytes = raw_text.len()))]
    pub async fn summarize_transcript(&self, raw_text: &str) -> Result<SummaryResult> {
        let started = Instant::now();

        let transcript = Transcript::parse(raw_text)?;
        let chunks = self.segmenter.segment(transcript.as_str());
        if chunks.is_empty() {
            return Err(InputError::EmptyTranscript.into());
        }
        tracing::info!(
            words = transcript.word_count(),
            chunks = chunks.len(),
            "Segmented transcript"
        );

        self.manager.ensure_loaded().await?;
        let results = self.scheduler.summarize_all(&chunks).await?;
        let aggregate = self.aggregator.aggregate(&results).await?;

        let result = SummaryResult {
            text: aggregate.text,
            chunk_diagnostics: results,
            elapsed: started.elapsed(),
            second_stage: aggregate.second_stage,
        };
        tracing::info!(
            chunks = result.chunk_diagnostics.len(),
            failed = result.failed_chunks(),
            elapsed = ?result.elapsed,
            second_stage = ?result.second_stage,
            "Summary complete"
        );
        Ok(result)
    }
}

/// Summarizes `raw_text` with `config`, sharing `manager`'s model.
///
/// # Errors
///
/// See [`TranscriptSummarizer::summarize_transcript`].
pub async fn summarize_transcript(
    manager: &ModelLifecycleManager,
    raw_text: &str,
    config: &SummaryConfig,
) -> Result<SummaryResult> {
    TranscriptSummarizer::new(manager.clone(), config)?
        .summarize_transcript(raw_text)
        .await
}
