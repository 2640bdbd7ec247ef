//! Transcript sources.
//!
//! The summarizer never fetches captions itself. It consumes transcript text
//! through [`TranscriptSource`]; the bundled implementation reads transcripts
//! that were saved ahead of time as `<dir>/<video_id>.txt`.

use crate::error::{InputError, IoError, Result, TranscriptError};
use crate::io::reader::read_file;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VIDEO_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").ok());

/// Something that can produce transcript text for a video id.
pub trait TranscriptSource: Send + Sync {
    /// Fetches the raw transcript text for a video.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError::NotFound`] when no transcript exists and
    /// [`TranscriptError::Unavailable`] when one exists but can't be used.
    fn fetch(&self, video_id: &str) -> Result<String>;
}

/// Checks that a video id has the 11-character form used by the hosting service.
///
/// # Errors
///
/// Returns [`InputError::InvalidVideoId`] for anything else.
pub fn validate_video_id(video_id: &str) -> Result<()> {
    let valid = VIDEO_ID
        .as_ref()
        .is_some_and(|re| re.is_match(video_id));
    if valid {
        Ok(())
    } else {
        Err(InputError::InvalidVideoId {
            id: video_id.to_string(),
        }
        .into())
    }
}

/// Reads transcripts stored as `<dir>/<video_id>.txt`.
///
/// # Examples
///
/// ```no_run
/// use recap_rs::io::{DirectoryTranscriptSource, TranscriptSource};
///
/// let source = DirectoryTranscriptSource::new("transcripts");
/// let text = source.fetch("dQw4w9WgXcQ").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryTranscriptSource {
    root: PathBuf,
}

impl DirectoryTranscriptSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory transcripts are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, video_id: &str) -> PathBuf {
        self.root.join(format!("{video_id}.txt"))
    }
}

impl TranscriptSource for DirectoryTranscriptSource {
    fn fetch(&self, video_id: &str) -> Result<String> {
        validate_video_id(video_id)?;

        let path = self.path_for(video_id);
        let text = match read_file(&path) {
            Ok(text) => text,
            Err(crate::Error::Io(IoError::FileNotFound { .. })) => {
                return Err(TranscriptError::NotFound {
                    video_id: video_id.to_string(),
                }
                .into());
            }
            Err(e) => {
                return Err(TranscriptError::Unavailable {
                    video_id: video_id.to_string(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        if text.trim().is_empty() {
            return Err(TranscriptError::Unavailable {
                video_id: video_id.to_string(),
                reason: "transcript is empty".to_string(),
            }
            .into());
        }

        tracing::debug!(video_id, bytes = text.len(), "Fetched transcript");
        Ok(text)
    }
}
