//! Summarization configuration.
//!
//! [`SummaryConfig`] gathers every tunable of the pipeline. Values come
//! from, in increasing precedence: built-in defaults, a JSON file, and
//! command-line flags or environment variables.

use crate::chunking::{
    DEFAULT_MAX_CHUNK_WORDS, DEFAULT_OVERLAP_SENTENCES, TranscriptSegmenter, create_tokenizer,
};
use crate::error::{Error, Result};
use crate::io::read_file;
use crate::model::lifecycle::{DEFAULT_IDLE_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
use crate::model::{DEFAULT_BACKEND, LifecycleConfig, SummaryLength};
use crate::pipeline::aggregator::{DEFAULT_COHERENCE_THRESHOLD_WORDS, DEFAULT_SECOND_STAGE_LENGTH};
use crate::pipeline::{AggregatorConfig, DEFAULT_WORKER_LIMIT, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Pipeline configuration.
///
/// # Examples
///
/// ```
/// use recap_rs::SummaryConfig;
///
/// let config = SummaryConfig::default()
///     .with_max_chunk_words(300)
///     .with_worker_count(6);
/// assert!(config.validate().is_ok());
///
/// let parsed: SummaryConfig = serde_json::from_str(r#"{"overlap_sentences": 2}"#).unwrap();
/// assert_eq!(parsed.overlap_sentences, 2);
/// assert_eq!(parsed.max_chunk_words, 400);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    /// Maximum words per chunk.
    pub max_chunk_words: usize,
    /// Sentences carried from one chunk into the next.
    pub overlap_sentences: usize,
    /// Chunks summarized concurrently.
    pub worker_count: usize,
    /// Seconds of inactivity before the model is unloaded.
    pub idle_unload_seconds: u64,
    /// Seconds between idle checks.
    pub sweep_interval_seconds: u64,
    /// Joined summary length, in words, above which a second pass runs.
    pub coherence_threshold_words: usize,
    /// Second-pass maximum length in words.
    pub second_stage_max_length: usize,
    /// Second-pass minimum length in words.
    pub second_stage_min_length: usize,
    /// Budget for a single chunk's inference call.
    pub per_chunk_timeout_ms: Option<u64>,
    /// Time after which no new chunk is started.
    pub request_timeout_ms: Option<u64>,
    /// Sentence tokenizer name.
    pub tokenizer: String,
    /// Inference backend name.
    pub backend: String,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_chunk_words: DEFAULT_MAX_CHUNK_WORDS,
            overlap_sentences: DEFAULT_OVERLAP_SENTENCES,
            worker_count: DEFAULT_WORKER_LIMIT,
            idle_unload_seconds: DEFAULT_IDLE_TIMEOUT.as_secs(),
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL.as_secs(),
            coherence_threshold_words: DEFAULT_COHERENCE_THRESHOLD_WORDS,
            second_stage_max_length: DEFAULT_SECOND_STAGE_LENGTH.max_length,
            second_stage_min_length: DEFAULT_SECOND_STAGE_LENGTH.min_length,
            per_chunk_timeout_ms: None,
            request_timeout_ms: None,
            tokenizer: "punctuation".to_string(),
            backend: DEFAULT_BACKEND.to_string(),
        }
    }
}

impl SummaryConfig {
    /// Loads and validates a JSON configuration file.
    ///
    /// Missing fields take their defaults; unknown fields are rejected.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file can't be read, or
    /// [`Error::Config`] if it doesn't parse or holds invalid values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_file(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::Config {
                message: message.to_string(),
            })
        };

        if self.max_chunk_words == 0 {
            return invalid("max_chunk_words must be > 0");
        }
        if self.worker_count == 0 {
            return invalid("worker_count must be > 0");
        }
        if self.sweep_interval_seconds == 0 {
            return invalid("sweep_interval_seconds must be > 0");
        }
        if self.second_stage_max_length == 0 {
            return invalid("second_stage_max_length must be > 0");
        }
        if self.second_stage_min_length > self.second_stage_max_length {
            return invalid("second_stage_min_length must not exceed second_stage_max_length");
        }
        if self.per_chunk_timeout_ms == Some(0) {
            return invalid("per_chunk_timeout_ms must be > 0");
        }
        if self.request_timeout_ms == Some(0) {
            return invalid("request_timeout_ms must be > 0");
        }
        create_tokenizer(&self.tokenizer).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Sets the maximum words per chunk.
    #[must_use]
    pub const fn with_max_chunk_words(mut self, words: usize) -> Self {
        self.max_chunk_words = words;
        self
    }

    /// Sets the sentence overlap between chunks.
    #[must_use]
    pub const fn with_overlap_sentences(mut self, sentences: usize) -> Self {
        self.overlap_sentences = sentences;
        self
    }

    /// Sets the number of concurrent workers.
    #[must_use]
    pub const fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Sets the idle-unload timeout in seconds.
    #[must_use]
    pub const fn with_idle_unload_seconds(mut self, seconds: u64) -> Self {
        self.idle_unload_seconds = seconds;
        self
    }

    /// Sets the idle sweep interval in seconds.
    #[must_use]
    pub const fn with_sweep_interval_seconds(mut self, seconds: u64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    /// Sets the coherence threshold in words.
    #[must_use]
    pub const fn with_coherence_threshold_words(mut self, words: usize) -> Self {
        self.coherence_threshold_words = words;
        self
    }

    /// Sets the second-pass length bounds.
    #[must_use]
    pub const fn with_second_stage_length(mut self, max_length: usize, min_length: usize) -> Self {
        self.second_stage_max_length = max_length;
        self.second_stage_min_length = min_length;
        self
    }

    /// Sets the per-chunk inference budget in milliseconds.
    #[must_use]
    pub const fn with_per_chunk_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.per_chunk_timeout_ms = ms;
        self
    }

    /// Sets the request deadline in milliseconds.
    #[must_use]
    pub const fn with_request_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Sets the sentence tokenizer.
    #[must_use]
    pub fn with_tokenizer(mut self, name: impl Into<String>) -> Self {
        self.tokenizer = name.into();
        self
    }

    /// Sets the inference backend.
    #[must_use]
    pub fn with_backend(mut self, name: impl Into<String>) -> Self {
        self.backend = name.into();
        self
    }

    /// Builds the segmenter described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokenizer name is unknown or
    /// `max_chunk_words` is zero.
    pub fn segmenter(&self) -> Result<TranscriptSegmenter> {
        TranscriptSegmenter::with_tokenizer(
            create_tokenizer(&self.tokenizer)?,
            self.max_chunk_words,
            self.overlap_sentences,
        )
    }

    /// Idle-unload timing for the lifecycle manager.
    #[must_use]
    pub const fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            idle_timeout: Duration::from_secs(self.idle_unload_seconds),
            sweep_interval: Duration::from_secs(self.sweep_interval_seconds),
        }
    }

    /// Scheduler settings.
    #[must_use]
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            worker_limit: self.worker_count,
            per_chunk_timeout: self.per_chunk_timeout_ms.map(Duration::from_millis),
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Aggregator settings.
    #[must_use]
    pub const fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            coherence_threshold_words: self.coherence_threshold_words,
            second_stage: SummaryLength::new(
                self.second_stage_max_length,
                self.second_stage_min_length,
            ),
        }
    }
}
