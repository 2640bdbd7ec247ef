//! Summarization results.
//!
//! A [`ChunkResult`] is written exactly once per chunk by the worker that
//! processed it. Failed chunks carry a visible placeholder text so that
//! degradation is never silent.

use serde::{Serialize, Serializer};
use std::time::Duration;

/// Why a chunk could not be summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkFailure {
    /// The inference backend reported an error.
    Inference {
        /// Reason reported by the backend.
        reason: String,
    },
    /// The per-chunk time budget was exceeded.
    Timeout {
        /// Budget in milliseconds.
        after_ms: u64,
    },
    /// The request deadline expired before the chunk was started.
    DeadlineExceeded,
    /// The worker processing the chunk panicked.
    WorkerPanicked,
}

impl std::fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inference { reason } => write!(f, "inference failed: {reason}"),
            Self::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
            Self::DeadlineExceeded => f.write_str("request deadline exceeded"),
            Self::WorkerPanicked => f.write_str("worker panicked"),
        }
    }
}

/// Outcome of summarizing a single chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkResult {
    /// Index of the chunk this result belongs to.
    pub index: usize,
    /// Summary text, or the error placeholder on failure.
    pub summary_text: String,
    /// Whether the chunk was summarized successfully.
    pub ok: bool,
    /// Failure details when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ChunkFailure>,
}

impl ChunkResult {
    /// Creates a successful result.
    #[must_use]
    pub const fn success(index: usize, summary_text: String) -> Self {
        Self {
            index,
            summary_text,
            ok: true,
            failure: None,
        }
    }

    /// Creates a failed result with the standard placeholder text.
    #[must_use]
    pub fn failed(index: usize, failure: ChunkFailure) -> Self {
        Self {
            index,
            summary_text: Self::placeholder(index),
            ok: false,
            failure: Some(failure),
        }
    }

    /// Placeholder text substituted for a chunk that could not be summarized.
    #[must_use]
    pub fn placeholder(index: usize) -> String {
        format!("[Error summarizing chunk {index}]")
    }
}

/// What happened in the coherence-restoring second pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SecondStage {
    /// The joined text was within the coherence threshold (or there was one chunk).
    NotNeeded,
    /// The joined text was condensed by one more summarization call.
    Condensed,
    /// The second pass failed; the raw joined text was returned instead.
    Fallback {
        /// Why the second pass failed.
        reason: String,
    },
}

/// Final result of summarizing a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    /// Final summary text (may be degraded if chunks failed).
    pub text: String,
    /// Per-chunk results in chunk order.
    pub chunk_diagnostics: Vec<ChunkResult>,
    /// Wall-clock time spent on the request.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Outcome of the second summarization pass.
    pub second_stage: SecondStage,
}

impl SummaryResult {
    /// Number of chunks that failed.
    #[must_use]
    pub fn failed_chunks(&self) -> usize {
        self.chunk_diagnostics.iter().filter(|r| !r.ok).count()
    }

    /// Whether any part of the pipeline degraded the output.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.failed_chunks() > 0 || matches!(self.second_stage, SecondStage::Fallback { .. })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_result_placeholder() {
        let result = ChunkResult::failed(
            7,
            ChunkFailure::Inference {
                reason: "boom".to_string(),
            },
        );
        assert!(!result.ok);
        assert_eq!(result.summary_text, "[Error summarizing chunk 7]");
        assert_eq!(result.index, 7);
    }

    #[test]
    fn test_chunk_failure_display() {
        assert_eq!(
            ChunkFailure::Timeout { after_ms: 250 }.to_string(),
            "timed out after 250ms"
        );
        assert_eq!(
            ChunkFailure::DeadlineExceeded.to_string(),
            "request deadline exceeded"
        );
    }

    #[test]
    fn test_summary_result_degraded() {
        let mut result = SummaryResult {
            text: "ok".to_string(),
            chunk_diagnostics: vec![ChunkResult::success(0, "ok".to_string())],
            elapsed: Duration::from_millis(12),
            second_stage: SecondStage::NotNeeded,
        };
        assert!(!result.is_degraded());

        result.second_stage = SecondStage::Fallback {
            reason: "boom".to_string(),
        };
        assert!(result.is_degraded());
    }

    #[test]
    fn test_summary_result_json() {
        let result = SummaryResult {
            text: "summary".to_string(),
            chunk_diagnostics: vec![
                ChunkResult::success(0, "a".to_string()),
                ChunkResult::failed(1, ChunkFailure::DeadlineExceeded),
            ],
            elapsed: Duration::from_millis(1500),
            second_stage: SecondStage::NotNeeded,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["second_stage"]["status"], "not_needed");
        assert_eq!(json["chunk_diagnostics"][1]["failure"]["kind"], "deadline_exceeded");
        assert!(json["chunk_diagnostics"][0].get("failure").is_none());
    }
}
