//! Merging chunk summaries into the final summary.
//!
//! Chunk summaries are joined in chunk order. When the joined text is long
//! enough to read as a list of disconnected fragments it gets one more
//! summarization pass; if that pass fails the joined text is returned
//! unchanged so a second-stage problem never loses first-stage work.

use crate::core::{ChunkResult, SecondStage};
use crate::error::{InputError, Result};
use crate::io::unicode::word_count;
use crate::model::{ModelLifecycleManager, SummaryLength};

/// Default joined length, in words, above which a second pass runs.
pub const DEFAULT_COHERENCE_THRESHOLD_WORDS: usize = 1000;

/// Default second-pass length bounds.
pub const DEFAULT_SECOND_STAGE_LENGTH: SummaryLength = SummaryLength::new(250, 100);

/// Aggregator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Joined word count above which the second pass runs.
    pub coherence_threshold_words: usize,
    /// Length bounds for the second pass.
    pub second_stage: SummaryLength,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            coherence_threshold_words: DEFAULT_COHERENCE_THRESHOLD_WORDS,
            second_stage: DEFAULT_SECOND_STAGE_LENGTH,
        }
    }
}

/// Output of [`SummaryAggregator::aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    /// Final summary text.
    pub text: String,
    /// What the second pass did.
    pub second_stage: SecondStage,
}

/// Combines per-chunk summaries.
#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    manager: ModelLifecycleManager,
    config: AggregatorConfig,
}

impl SummaryAggregator {
    /// Creates an aggregator that runs its second pass through `manager`.
    #[must_use]
    pub const fn new(manager: ModelLifecycleManager, config: AggregatorConfig) -> Self {
        Self { manager, config }
    }

    /// Merges `results` (in chunk order) into one summary.
    ///
    /// A single result is returned as-is. Otherwise the summaries are joined
    /// with spaces and, if the join exceeds the coherence threshold,
    /// condensed by exactly one further summarization call.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::EmptyTranscript`] if `results` is empty.
    #[tracing::instrument(skip_all, fields(chunks = results.len()))]
    pub async fn aggregate(&self, results: &[ChunkResult]) -> Result<Aggregate> {
        let joined = match results {
            [] => return Err(InputError::EmptyTranscript.into()),
            [only] => {
                return Ok(Aggregate {
                    text: only.summary_text.clone(),
                    second_stage: SecondStage::NotNeeded,
                });
            }
            _ => results
                .iter()
                .map(|r| r.summary_text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        };

        let words = word_count(&joined);
        if words <= self.config.coherence_threshold_words {
            return Ok(Aggregate {
                text: joined,
                second_stage: SecondStage::NotNeeded,
            });
        }

        tracing::debug!(
            words,
            threshold = self.config.coherence_threshold_words,
            "Condensing joined summaries"
        );
        let length = self.config.second_stage;
        match self
            .manager
            .summarize(&joined, length.max_length, length.min_length)
            .await
        {
            Ok(text) => Ok(Aggregate {
                text,
                second_stage: SecondStage::Condensed,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Second-stage summarization failed, using joined summaries");
                Ok(Aggregate {
                    text: joined,
                    second_stage: SecondStage::Fallback {
                        reason: e.to_string(),
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChunkFailure;
    use crate::model::testing::ScriptedBackend;
    use crate::model::{InferenceBackend, LifecycleConfig};
    use std::sync::Arc;

    fn aggregator(backend: &Arc<ScriptedBackend>, threshold: usize) -> SummaryAggregator {
        let manager = ModelLifecycleManager::new(
            Arc::clone(backend) as Arc<dyn InferenceBackend>,
            LifecycleConfig::default(),
        );
        SummaryAggregator::new(
            manager,
            AggregatorConfig {
                coherence_threshold_words: threshold,
                ..AggregatorConfig::default()
            },
        )
    }

    fn results(texts: &[&str]) -> Vec<ChunkResult> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| ChunkResult::success(i, (*t).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_results_rejected() {
        let backend = Arc::new(ScriptedBackend::new());
        let err = aggregator(&backend, 1000).aggregate(&[]).await.unwrap_err();
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_single_result_returned_unchanged() {
        let backend = Arc::new(ScriptedBackend::new());
        let long = "word ".repeat(2000);
        let aggregate = aggregator(&backend, 10)
            .aggregate(&results(&[&long]))
            .await
            .unwrap();

        assert_eq!(aggregate.text, long);
        assert_eq!(aggregate.second_stage, SecondStage::NotNeeded);
        assert_eq!(backend.infers(), 0);
    }

    #[tokio::test]
    async fn test_short_join_not_condensed() {
        let backend = Arc::new(ScriptedBackend::new());
        let aggregate = aggregator(&backend, 1000)
            .aggregate(&results(&["First part.", "Second part."]))
            .await
            .unwrap();

        assert_eq!(aggregate.text, "First part. Second part.");
        assert_eq!(aggregate.second_stage, SecondStage::NotNeeded);
        assert_eq!(backend.loads(), 0);
    }

    #[tokio::test]
    async fn test_threshold_is_exclusive() {
        let backend = Arc::new(ScriptedBackend::new());
        // Four words joined, threshold four: not condensed
        let aggregate = aggregator(&backend, 4)
            .aggregate(&results(&["a b", "c d"]))
            .await
            .unwrap();
        assert_eq!(aggregate.second_stage, SecondStage::NotNeeded);
    }

    #[tokio::test]
    async fn test_long_join_condensed_once() {
        let backend = Arc::new(ScriptedBackend::new());
        let aggregate = aggregator(&backend, 3)
            .aggregate(&results(&["one two", "three four", "five six"]))
            .await
            .unwrap();

        assert_eq!(aggregate.text, "summary(one two three four five six)");
        assert_eq!(aggregate.second_stage, SecondStage::Condensed);
        assert_eq!(backend.infers(), 1);
    }

    #[tokio::test]
    async fn test_second_stage_failure_falls_back_to_join() {
        let backend = Arc::new(ScriptedBackend::new().failing_on(|_| true));
        let aggregate = aggregator(&backend, 3)
            .aggregate(&results(&["one two", "three four", "five six"]))
            .await
            .unwrap();

        assert_eq!(aggregate.text, "one two three four five six");
        assert!(matches!(
            aggregate.second_stage,
            SecondStage::Fallback { ref reason } if reason.contains("out of memory")
        ));
    }

    #[tokio::test]
    async fn test_placeholders_are_kept_in_order() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut input = results(&["Intro.", "", "Outro."]);
        input[1] = ChunkResult::failed(1, ChunkFailure::DeadlineExceeded);

        let aggregate = aggregator(&backend, 1000).aggregate(&input).await.unwrap();
        assert_eq!(aggregate.text, "Intro. [Error summarizing chunk 1] Outro.");
    }
}
