//! Bounded-concurrency chunk summarization.
//!
//! A fixed number of workers pull chunk indices from a shared cursor and
//! write each result into that chunk's own write-once slot. Results come
//! back in chunk order no matter which worker finishes first, and one
//! chunk's failure never touches another chunk's slot.

use crate::core::{Chunk, ChunkFailure, ChunkResult};
use crate::error::{Error, ModelError, Result};
use crate::model::{ModelLifecycleManager, SummaryLength};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Default number of concurrent workers.
pub const DEFAULT_WORKER_LIMIT: usize = 4;

const MAX_SUMMARY_WORDS: usize = 150;
const MIN_SUMMARY_WORDS: usize = 40;
const MAX_SUMMARY_FLOOR: usize = 40;
const MIN_SUMMARY_FLOOR: usize = 20;

/// Computes per-chunk summary bounds from the chunk's word count.
///
/// `max_length` is 40% of the input clamped to 40..=150 words and
/// `min_length` is 20% clamped to 20..=40, each rounded half away from zero.
///
/// # Examples
///
/// ```
/// use recap_rs::pipeline::target_lengths;
///
/// let length = target_lengths(200);
/// assert_eq!((length.max_length, length.min_length), (80, 40));
/// ```
#[must_use]
pub fn target_lengths(word_count: usize) -> SummaryLength {
    // round(wc * 2/5) and round(wc / 5) in integer arithmetic
    let max = (word_count.saturating_mul(4).saturating_add(5) / 10)
        .clamp(MAX_SUMMARY_FLOOR, MAX_SUMMARY_WORDS);
    let min = (word_count.saturating_mul(2).saturating_add(5) / 10)
        .clamp(MIN_SUMMARY_FLOOR, MIN_SUMMARY_WORDS);
    SummaryLength::new(max, min)
}

/// Scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of chunks summarized at once.
    pub worker_limit: usize,
    /// Budget for a single inference call.
    pub per_chunk_timeout: Option<Duration>,
    /// Time after which no new chunk is started.
    pub request_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_limit: DEFAULT_WORKER_LIMIT,
            per_chunk_timeout: None,
            request_timeout: None,
        }
    }
}

/// Summarizes chunks concurrently through a [`ModelLifecycleManager`].
#[derive(Debug, Clone)]
pub struct ChunkScheduler {
    manager: ModelLifecycleManager,
    config: SchedulerConfig,
}

impl ChunkScheduler {
    /// Creates a scheduler. A `worker_limit` of zero is treated as one.
    #[must_use]
    pub const fn new(manager: ModelLifecycleManager, config: SchedulerConfig) -> Self {
        Self { manager, config }
    }

    /// Returns the scheduler settings.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Summarizes every chunk, returning one result per chunk in input
    /// order. Each result carries its chunk's own `index`.
    ///
    /// At most `worker_limit` chunks are in flight at once. Inference
    /// errors and timeouts become failed results with a placeholder text.
    /// If the request deadline passes, chunks whose inference has not
    /// started are marked [`ChunkFailure::DeadlineExceeded`] while running
    /// ones finish. On a serial backend that includes chunks still waiting
    /// for their turn on the model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LoadFailed`] if the model cannot be loaded.
    /// Remaining chunks are abandoned in that case.
    #[tracing::instrument(skip_all, fields(chunks = chunks.len(), workers = tracing::field::Empty))]
    pub async fn summarize_all(&self, chunks: &[Chunk]) -> Result<Vec<ChunkResult>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.config.worker_limit.clamp(1, chunks.len());
        tracing::Span::current().record("workers", workers);

        let state = Arc::new(Arena {
            chunks: chunks.to_vec(),
            slots: (0..chunks.len()).map(|_| OnceLock::new()).collect(),
            cursor: AtomicUsize::new(0),
            fatal: OnceLock::new(),
            deadline: self.config.request_timeout.map(|t| Instant::now() + t),
            per_chunk_timeout: self.config.per_chunk_timeout,
        });

        let mut set = JoinSet::new();
        for worker in 0..workers {
            let manager = self.manager.clone();
            let state = Arc::clone(&state);
            set.spawn(async move { state.work(worker, &manager).await });
        }
        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Summarization worker panicked");
            }
        }

        if let Some(err) = state.fatal.get() {
            return Err(err.clone().into());
        }
        Ok(state.collect())
    }
}

/// Shared by all workers of one `summarize_all` call.
struct Arena {
    chunks: Vec<Chunk>,
    slots: Vec<OnceLock<ChunkResult>>,
    cursor: AtomicUsize,
    fatal: OnceLock<ModelError>,
    deadline: Option<Instant>,
    per_chunk_timeout: Option<Duration>,
}

impl Arena {
    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    async fn work(&self, worker: usize, manager: &ModelLifecycleManager) {
        loop {
            if self.fatal.get().is_some() {
                break;
            }
            if self.deadline_passed() {
                tracing::warn!(worker, "Request deadline passed, not starting more chunks");
                break;
            }

            let slot = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(chunk) = self.chunks.get(slot) else {
                break;
            };

            match self.summarize(chunk, manager).await {
                Ok(result) => {
                    let _ = self.slots[slot].set(result);
                }
                Err(err) => {
                    let _ = self.fatal.set(err);
                    break;
                }
            }
        }
    }

    /// Only a load failure is returned as `Err`; everything else is a chunk result.
    async fn summarize(
        &self,
        chunk: &Chunk,
        manager: &ModelLifecycleManager,
    ) -> std::result::Result<ChunkResult, ModelError> {
        let length = target_lengths(chunk.word_count);
        tracing::debug!(
            chunk = chunk.index,
            words = chunk.word_count,
            max_length = length.max_length,
            min_length = length.min_length,
            "Summarizing chunk"
        );

        let lease = match manager.acquire().await {
            Ok(lease) => lease,
            Err(Error::Model(err @ ModelError::LoadFailed { .. })) => return Err(err),
            Err(e) => {
                return Ok(failed(
                    chunk.index,
                    ChunkFailure::Inference {
                        reason: e.to_string(),
                    },
                ));
            }
        };

        let turn = match lease.turn().await {
            Ok(turn) => turn,
            Err(e) => {
                return Ok(failed(
                    chunk.index,
                    ChunkFailure::Inference {
                        reason: e.to_string(),
                    },
                ));
            }
        };
        if self.deadline_passed() {
            tracing::warn!(chunk = chunk.index, "Request deadline passed while waiting for the model");
            return Ok(failed(chunk.index, ChunkFailure::DeadlineExceeded));
        }

        let result = turn
            .summarize_within(&chunk.text, length, self.per_chunk_timeout)
            .await;
        Ok(match result {
            Ok(text) => {
                tracing::debug!(chunk = chunk.index, "Chunk summarized");
                ChunkResult::success(chunk.index, text)
            }
            Err(Error::Model(ModelError::Timeout { after_ms })) => {
                failed(chunk.index, ChunkFailure::Timeout { after_ms })
            }
            Err(Error::Model(ModelError::Inference { reason })) => {
                failed(chunk.index, ChunkFailure::Inference { reason })
            }
            Err(e) => failed(
                chunk.index,
                ChunkFailure::Inference {
                    reason: e.to_string(),
                },
            ),
        })
    }

    /// Turns slots into results, accounting for chunks nobody finished.
    fn collect(&self) -> Vec<ChunkResult> {
        let claimed = self.cursor.load(Ordering::SeqCst).min(self.slots.len());
        let expired = self.deadline_passed();

        self.slots
            .iter()
            .zip(&self.chunks)
            .enumerate()
            .map(|(position, (slot, chunk))| match slot.get() {
                Some(result) => result.clone(),
                // Claimed but never written: its worker died mid-chunk
                None if position < claimed || !expired => {
                    failed(chunk.index, ChunkFailure::WorkerPanicked)
                }
                None => failed(chunk.index, ChunkFailure::DeadlineExceeded),
            })
            .collect()
    }
}

fn failed(index: usize, failure: ChunkFailure) -> ChunkResult {
    tracing::warn!(chunk = index, %failure, "Chunk failed");
    ChunkResult::failed(index, failure)
}
