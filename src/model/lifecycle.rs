//! Model lifecycle management.
//!
//! [`ModelLifecycleManager`] owns one [`InferenceBackend`] and moves it
//! between three states:
//!
//! ```text
//! Unloaded --acquire--> Loading --ok--> Loaded --idle sweep / unload--> Unloaded
//!                          \--err--> Unloaded
//! ```
//!
//! Every transition happens under a single async lock. Callers use the
//! model through a [`ModelLease`]: `acquire` loads the model if needed and
//! registers the lease before releasing that lock, and the idle sweep only
//! unloads while holding the same lock with no leases outstanding. A sweep
//! therefore can never unload the model between a caller's load check and
//! its inference call.

use crate::error::{Error, ModelError, Result};
use crate::model::{InferenceBackend, SummaryLength};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default inactivity period before the model is unloaded.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default period between idle checks.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Load state of the managed model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ModelState {
    /// No model in memory.
    Unloaded = 0,
    /// A load is in progress.
    Loading = 1,
    /// The model is ready for inference.
    Loaded = 2,
}

impl ModelState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Loading,
            2 => Self::Loaded,
            _ => Self::Unloaded,
        }
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
        };
        f.write_str(name)
    }
}

/// Idle-unload timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Inactivity after which a loaded, unused model is unloaded.
    pub idle_timeout: Duration,
    /// How often the idle sweeper checks.
    pub sweep_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

struct Shared {
    backend: Arc<dyn InferenceBackend>,
    config: LifecycleConfig,
    /// Serializes load, unload and lease registration.
    transition: Mutex<()>,
    state: AtomicU8,
    active: AtomicUsize,
    loads: AtomicU64,
    last_used: StdMutex<Instant>,
    /// One permit for serial backends.
    gate: Semaphore,
}

impl Shared {
    fn state(&self) -> ModelState {
        ModelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ModelState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn touch(&self) {
        let now = Instant::now();
        *self
            .last_used
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = now;
    }

    fn last_used(&self) -> Instant {
        *self
            .last_used
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Must be called with the transition lock held.
    #[tracing::instrument(skip_all, fields(backend = self.backend.name()))]
    async fn load(&self) -> Result<()> {
        self.set_state(ModelState::Loading);
        let mut reset = ResetOnDrop {
            state: &self.state,
            armed: true,
        };
        self.loads.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();

        match self.backend.load().await {
            Ok(()) => {
                reset.armed = false;
                drop(reset);
                self.set_state(ModelState::Loaded);
                self.touch();
                tracing::info!(elapsed = ?started.elapsed(), "Model loaded");
                Ok(())
            }
            Err(e) => {
                drop(reset);
                let err = match e {
                    Error::Model(err @ ModelError::LoadFailed { .. }) => err,
                    Error::Model(inner) => ModelError::LoadFailed {
                        backend: self.backend.name().to_string(),
                        reason: inner.to_string(),
                    },
                    other => ModelError::LoadFailed {
                        backend: self.backend.name().to_string(),
                        reason: other.to_string(),
                    },
                };
                tracing::error!(error = %err, "Model load failed");
                Err(err.into())
            }
        }
    }

    /// Must be called with the transition lock held.
    async fn unload(&self, reason: &'static str) {
        self.backend.unload().await;
        self.set_state(ModelState::Unloaded);
        tracing::info!(backend = self.backend.name(), reason, "Model unloaded");
    }
}

/// Puts the state back to `Unloaded` if a load is abandoned midway.
struct ResetOnDrop<'a> {
    state: &'a AtomicU8,
    armed: bool,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .store(ModelState::Unloaded as u8, Ordering::SeqCst);
        }
    }
}

/// Shares one lazily loaded model between concurrent requests.
///
/// Cloning is cheap; all clones manage the same model.
///
/// # Examples
///
/// ```
/// use recap_rs::model::{ExtractiveBackend, LifecycleConfig, ModelLifecycleManager, ModelState};
/// use std::sync::Arc;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// # rt.block_on(async {
/// let manager = ModelLifecycleManager::new(
///     Arc::new(ExtractiveBackend::new()),
///     LifecycleConfig::default(),
/// );
/// assert_eq!(manager.state(), ModelState::Unloaded);
///
/// let summary = manager.summarize("Short text.", 150, 40).await.unwrap();
/// assert_eq!(summary, "Short text.");
/// assert_eq!(manager.state(), ModelState::Loaded);
/// # });
/// ```
#[derive(Clone)]
pub struct ModelLifecycleManager {
    shared: Arc<Shared>,
}

impl fmt::Debug for ModelLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLifecycleManager")
            .field("backend", &self.shared.backend.name())
            .field("state", &self.state())
            .field("active_uses", &self.active_uses())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl ModelLifecycleManager {
    /// Creates a manager for `backend`. Nothing is loaded until first use.
    pub fn new(backend: Arc<dyn InferenceBackend>, config: LifecycleConfig) -> Self {
        let permits = if backend.supports_concurrent_inference() {
            Semaphore::MAX_PERMITS
        } else {
            1
        };
        Self {
            shared: Arc::new(Shared {
                backend,
                config,
                transition: Mutex::new(()),
                state: AtomicU8::new(ModelState::Unloaded as u8),
                active: AtomicUsize::new(0),
                loads: AtomicU64::new(0),
                last_used: StdMutex::new(Instant::now()),
                gate: Semaphore::new(permits),
            }),
        }
    }

    /// Returns the idle-unload timing.
    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.shared.config
    }

    /// Returns the current load state.
    #[must_use]
    pub fn state(&self) -> ModelState {
        self.shared.state()
    }

    /// Returns the number of outstanding leases.
    #[must_use]
    pub fn active_uses(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Returns how many times a load has been attempted.
    #[must_use]
    pub fn load_count(&self) -> u64 {
        self.shared.loads.load(Ordering::SeqCst)
    }

    /// Returns the time of the most recent load or completed use.
    #[must_use]
    pub fn last_used(&self) -> Instant {
        self.shared.last_used()
    }

    /// Takes a lease on the model, loading it first if necessary.
    ///
    /// Concurrent callers that find the model unloaded wait for a single
    /// load rather than each starting their own.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LoadFailed`] if the backend fails to load.
    pub async fn acquire(&self) -> Result<ModelLease> {
        let _transition = self.shared.transition.lock().await;
        if self.shared.state() != ModelState::Loaded {
            self.shared.load().await?;
        }
        self.shared.active.fetch_add(1, Ordering::SeqCst);
        self.shared.touch();
        Ok(ModelLease {
            shared: Arc::clone(&self.shared),
        })
    }

    /// Loads the model now instead of on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LoadFailed`] if the backend fails to load.
    pub async fn ensure_loaded(&self) -> Result<()> {
        self.acquire().await.map(drop)
    }

    /// Summarizes `text`, loading the model if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LoadFailed`] if the model can't be loaded, or
    /// [`ModelError::Inference`] if the call fails.
    pub async fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
        let lease = self.acquire().await?;
        lease
            .summarize(text, SummaryLength::new(max_length, min_length))
            .await
    }

    /// Unloads the model if it is loaded, unused, and idle for longer than
    /// the configured timeout as of `now`. Returns `true` if it unloaded.
    pub async fn unload_if_idle(&self, now: Instant) -> bool {
        let _transition = self.shared.transition.lock().await;
        if self.shared.state() != ModelState::Loaded || self.active_uses() > 0 {
            return false;
        }
        let idle = now.saturating_duration_since(self.shared.last_used());
        if idle <= self.shared.config.idle_timeout {
            return false;
        }
        self.shared.unload("idle").await;
        true
    }

    /// Unloads the model immediately.
    ///
    /// Refuses, returning `false`, while any lease is outstanding or when
    /// nothing is loaded.
    pub async fn unload(&self) -> bool {
        let _transition = self.shared.transition.lock().await;
        if self.shared.state() != ModelState::Loaded {
            return false;
        }
        let active = self.active_uses();
        if active > 0 {
            tracing::warn!(active, "Refusing to unload model in use");
            return false;
        }
        self.shared.unload("requested").await;
        true
    }

    /// Starts a background task that runs [`Self::unload_if_idle`] every
    /// sweep interval.
    ///
    /// The task holds only a weak reference and ends once every manager
    /// clone is dropped. Dropping the returned handle stops it as well.
    /// Must be called from within a tokio runtime.
    pub fn spawn_idle_sweeper(&self) -> IdleSweeper {
        let weak = Arc::downgrade(&self.shared);
        // interval_at panics on a zero period
        let period = self.shared.config.sweep_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                let manager = Self { shared };
                if manager.unload_if_idle(Instant::now()).await {
                    tracing::debug!("Idle sweep unloaded model");
                }
            }
            tracing::debug!("Idle sweeper stopped");
        });

        IdleSweeper { handle }
    }
}

/// A registered use of the loaded model.
///
/// While any lease exists the model will not be unloaded. Dropping the
/// lease records the time of use for idle tracking.
pub struct ModelLease {
    shared: Arc<Shared>,
}

impl fmt::Debug for ModelLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLease")
            .field("backend", &self.shared.backend.name())
            .finish_non_exhaustive()
    }
}

impl ModelLease {
    /// Runs one inference call.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Inference`] if the backend fails.
    pub async fn summarize(&self, text: &str, length: SummaryLength) -> Result<String> {
        self.summarize_within(text, length, None).await
    }

    /// Waits for a turn on the model.
    ///
    /// Serial backends hand out one turn at a time; concurrent backends
    /// never make callers wait here.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Inference`] if the gate has been closed.
    pub async fn turn(&self) -> Result<InferenceTurn<'_>> {
        let permit = self
            .shared
            .gate
            .acquire()
            .await
            .map_err(|e| ModelError::Inference {
                reason: e.to_string(),
            })?;
        Ok(InferenceTurn {
            shared: &self.shared,
            _permit: permit,
        })
    }

    /// Runs one inference call, giving up after `budget` if set.
    ///
    /// Time spent waiting for a turn on a serial backend does not count
    /// against the budget.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Timeout`] if the budget runs out, or
    /// [`ModelError::Inference`] if the backend fails.
    pub async fn summarize_within(
        &self,
        text: &str,
        length: SummaryLength,
        budget: Option<Duration>,
    ) -> Result<String> {
        self.turn().await?.summarize_within(text, length, budget).await
    }
}

/// Exclusive use of a serial model, or a slot on a concurrent one.
///
/// Obtained from [`ModelLease::turn`]; the turn ends when it is dropped.
pub struct InferenceTurn<'a> {
    shared: &'a Shared,
    _permit: SemaphorePermit<'a>,
}

impl fmt::Debug for InferenceTurn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceTurn")
            .field("backend", &self.shared.backend.name())
            .finish_non_exhaustive()
    }
}

impl InferenceTurn<'_> {
    /// Runs one inference call, giving up after `budget` if set.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Timeout`] if the budget runs out, or
    /// [`ModelError::Inference`] if the backend fails.
    pub async fn summarize_within(
        self,
        text: &str,
        length: SummaryLength,
        budget: Option<Duration>,
    ) -> Result<String> {
        let call = self.shared.backend.infer(text, length);
        let result = match budget {
            Some(budget) => match tokio::time::timeout(budget, call).await {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout {
                    after_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
                }
                .into()),
            },
            None => call.await,
        };
        self.shared.touch();

        result.map_err(|e| match e {
            Error::Model(_) => e,
            other => ModelError::Inference {
                reason: other.to_string(),
            }
            .into(),
        })
    }
}

impl Drop for ModelLease {
    fn drop(&mut self) {
        // Refresh before releasing so a sweep never sees zero uses with a stale timestamp
        self.shared.touch();
        self.shared.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to the idle sweeper task. Dropping it stops the task.
#[derive(Debug)]
pub struct IdleSweeper {
    handle: JoinHandle<()>,
}

impl IdleSweeper {
    /// Returns `true` once the sweeper task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for IdleSweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
