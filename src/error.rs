//! Error types for recap-rs operations.
//!
//! This module provides the error hierarchy using `thiserror` for the
//! summarization pipeline: transcript input, chunking, model lifecycle and
//! inference, transcript sources, I/O, and CLI commands.
//!
//! Only input and model-load failures abort a request. Per-chunk inference
//! failures and second-stage failures are absorbed by the pipeline and show
//! up as diagnostics on the [`crate::SummaryResult`] instead.

use thiserror::Error;

/// Result type alias for recap-rs operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for recap-rs operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or unusable transcript input.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Model lifecycle or inference errors.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Chunking-related errors (segmentation and tokenization).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Transcript source errors.
    #[error("transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Returns `true` if the request failed because its input was unusable.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// Returns `true` if the request failed because the model could not be loaded.
    #[must_use]
    pub const fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::Model(ModelError::LoadFailed { .. }))
    }
}

/// Transcript input errors. Fatal for the whole request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The transcript contained no sentences.
    #[error("empty transcript")]
    EmptyTranscript,

    /// The transcript could not be used.
    #[error("invalid transcript: {reason}")]
    InvalidTranscript {
        /// Why the transcript was rejected.
        reason: String,
    },

    /// The video identifier is not well formed.
    #[error("invalid video id: {id}")]
    InvalidVideoId {
        /// The rejected identifier.
        id: String,
    },
}

/// Model lifecycle and inference errors.
///
/// `Clone` so that a single load failure can be recorded by the scheduler
/// and handed back to the caller of the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The inference backend failed to initialize.
    #[error("model unavailable: {backend} failed to load: {reason}")]
    LoadFailed {
        /// Backend name.
        backend: String,
        /// Reason reported by the backend.
        reason: String,
    },

    /// Inference failed (resource exhaustion, malformed input, backend failure).
    #[error("inference failed: {reason}")]
    Inference {
        /// Reason reported by the backend.
        reason: String,
    },

    /// Inference exceeded its time budget.
    #[error("inference timed out after {after_ms}ms")]
    Timeout {
        /// Budget that was exceeded, in milliseconds.
        after_ms: u64,
    },

    /// Inference was attempted on a backend that is not loaded.
    #[error("model is not loaded")]
    NotLoaded,

    /// No backend is registered under this name.
    #[error("unknown backend: {name}")]
    UnknownBackend {
        /// Requested backend name.
        name: String,
    },
}

/// Chunking-specific errors for text segmentation.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid segmenter configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Unknown sentence tokenizer.
    #[error("unknown tokenizer: {name}")]
    UnknownTokenizer {
        /// Name of the unknown tokenizer.
        name: String,
    },
}

/// Transcript source errors.
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// No transcript exists for the video.
    #[error("no transcript found for video {video_id}")]
    NotFound {
        /// Requested video id.
        video_id: String,
    },

    /// A transcript exists but could not be retrieved.
    #[error("transcript unavailable for video {video_id}: {reason}")]
    Unavailable {
        /// Requested video id.
        video_id: String,
        /// Why the transcript could not be used.
        reason: String,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

// Implement From traits for standard library and third-party errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}
