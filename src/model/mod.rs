//! Summarization models and their lifecycle.
//!
//! An [`InferenceBackend`] turns text into a shorter summary. Backends are
//! expensive to load, so callers never use one directly: the
//! [`ModelLifecycleManager`] loads it lazily, shares it between concurrent
//! requests and unloads it after a period of inactivity.
//!
//! # Backends
//!
//! - `extractive`: deterministic sentence-scoring summarizer, always available
//! - `openai`: chat-completions summarizer (requires the `openai` feature)

mod extractive;
pub mod lifecycle;

#[cfg(feature = "openai")]
mod openai;

pub use extractive::ExtractiveBackend;
pub use lifecycle::{
    IdleSweeper, InferenceTurn, LifecycleConfig, ModelLease, ModelLifecycleManager, ModelState,
};

#[cfg(feature = "openai")]
pub use openai::OpenAiBackend;

use crate::error::{ModelError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the backend used when none is requested.
pub const DEFAULT_BACKEND: &str = "extractive";

/// Target summary length bounds, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLength {
    /// Upper bound on summary words.
    pub max_length: usize,
    /// Lower bound on summary words, where the input allows it.
    pub min_length: usize,
}

impl SummaryLength {
    /// Creates a length target.
    #[must_use]
    pub const fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length,
        }
    }
}

/// A summarization model.
///
/// Implementations must be `Send + Sync`; the lifecycle manager shares one
/// instance across all workers. `load` and `unload` are only ever called
/// while the manager holds its transition lock, and `infer` is only called
/// between a successful `load` and the next `unload`.
///
/// # Examples
///
/// ```
/// use recap_rs::model::{ExtractiveBackend, InferenceBackend};
///
/// let backend = ExtractiveBackend::new();
/// assert_eq!(backend.name(), "extractive");
/// assert!(backend.supports_concurrent_inference());
/// ```
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Returns the backend name.
    fn name(&self) -> &'static str;

    /// Returns `true` if `infer` may run concurrently on one loaded model.
    ///
    /// Backends returning `false` get at most one inference at a time.
    fn supports_concurrent_inference(&self) -> bool {
        false
    }

    /// Loads the model into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be initialized.
    async fn load(&self) -> Result<()>;

    /// Releases the model's resources.
    async fn unload(&self);

    /// Summarizes `text` within the given length bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the model is not loaded.
    async fn infer(&self, text: &str, length: SummaryLength) -> Result<String>;
}

/// Creates an inference backend by name.
///
/// # Arguments
///
/// * `name` - Backend name: "extractive", or "openai" with the `openai` feature.
///
/// # Errors
///
/// Returns [`ModelError::UnknownBackend`] if the name is not recognized or
/// its feature is not compiled in.
pub fn create_backend(name: &str) -> Result<Arc<dyn InferenceBackend>> {
    match name.to_lowercase().as_str() {
        "extractive" => Ok(Arc::new(ExtractiveBackend::new())),
        #[cfg(feature = "openai")]
        "openai" => Ok(Arc::new(OpenAiBackend::from_env())),
        _ => Err(ModelError::UnknownBackend {
            name: name.to_string(),
        }
        .into()),
    }
}

/// Lists available backend names.
#[must_use]
pub fn available_backends() -> Vec<&'static str> {
    #[cfg(feature = "openai")]
    {
        vec!["extractive", "openai"]
    }
    #[cfg(not(feature = "openai"))]
    {
        vec!["extractive"]
    }
}

/// Scripted backend for exercising the lifecycle manager and pipeline.
#[cfg(test)]
pub(crate) mod testing {
    use super::{InferenceBackend, SummaryLength};
    use crate::error::{ModelError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    type DelayFn = Box<dyn Fn(&str) -> Duration + Send + Sync>;
    type FailFn = Box<dyn Fn(&str) -> bool + Send + Sync>;

    /// Echoes `summary(<text>)` after a per-input delay.
    pub struct ScriptedBackend {
        pub loads: AtomicUsize,
        pub unloads: AtomicUsize,
        pub infers: AtomicUsize,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
        pub fail_loads: AtomicBool,
        loaded: AtomicBool,
        concurrent: bool,
        load_delay: Duration,
        delay: DelayFn,
        fail: FailFn,
    }

    impl ScriptedBackend {
        pub fn new() -> Self {
            Self {
                loads: AtomicUsize::new(0),
                unloads: AtomicUsize::new(0),
                infers: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                fail_loads: AtomicBool::new(false),
                loaded: AtomicBool::new(false),
                concurrent: true,
                load_delay: Duration::ZERO,
                delay: Box::new(|_| Duration::ZERO),
                fail: Box::new(|_| false),
            }
        }

        pub fn serial(mut self) -> Self {
            self.concurrent = false;
            self
        }

        pub fn with_load_delay(mut self, delay: Duration) -> Self {
            self.load_delay = delay;
            self
        }

        pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
            self.delay = Box::new(delay);
            self
        }

        pub fn failing_on(mut self, fail: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
            self.fail = Box::new(fail);
            self
        }

        pub fn failing_loads(self) -> Self {
            self.fail_loads.store(true, Ordering::SeqCst);
            self
        }

        pub fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }

        pub fn infers(&self) -> usize {
            self.infers.load(Ordering::SeqCst)
        }

        pub fn is_loaded(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn supports_concurrent_inference(&self) -> bool {
            self.concurrent
        }

        async fn load(&self) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if !self.load_delay.is_zero() {
                tokio::time::sleep(self.load_delay).await;
            }
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(ModelError::Inference {
                    reason: "weights missing".to_string(),
                }
                .into());
            }
            self.loaded.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn unload(&self) {
            self.unloads.fetch_add(1, Ordering::SeqCst);
            self.loaded.store(false, Ordering::SeqCst);
        }

        async fn infer(&self, text: &str, _length: SummaryLength) -> Result<String> {
            if !self.is_loaded() {
                return Err(ModelError::NotLoaded.into());
            }
            self.infers.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = (self.delay)(text);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if (self.fail)(text) {
                return Err(ModelError::Inference {
                    reason: "out of memory".to_string(),
                }
                .into());
            }
            Ok(format!("summary({text})"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backend() {
        let backend = create_backend("extractive").unwrap();
        assert_eq!(backend.name(), "extractive");

        let backend = create_backend("Extractive").unwrap();
        assert_eq!(backend.name(), "extractive");
    }

    #[test]
    fn test_create_backend_unknown() {
        let result = create_backend("t5-small");
        assert!(matches!(
            result,
            Err(crate::Error::Model(ModelError::UnknownBackend { .. }))
        ));
    }

    #[test]
    fn test_available_backends() {
        let names = available_backends();
        assert!(names.contains(&DEFAULT_BACKEND));
        for name in names {
            assert!(create_backend(name).is_ok());
        }
    }

    #[test]
    fn test_summary_length() {
        let length = SummaryLength::new(150, 40);
        assert_eq!(length.max_length, 150);
        assert_eq!(length.min_length, 40);
    }
}
