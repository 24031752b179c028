//! Wake word detection
//!
//! A background loop repeatedly samples speech capture and tests transcripts
//! for trigger phrases. On a match the detector pauses itself, invokes the
//! wake handler, and resumes only after the handler returns — so the handler
//! is never re-entered and the microphone is never contended while a
//! conversation session runs.
//!
//! The pause and running flags are `SeqCst` atomics: they are the only state
//! shared between the detector task and the controlling context, and the
//! mutual-exclusion guarantee rests on their visibility.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::speech::SpeechCapture;
use crate::{Error, Result};

/// State of the wake word detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Not started, or stopped
    Idle,
    /// Actively sampling for trigger phrases
    Listening,
    /// Sampling suspended (session in progress, or explicitly paused)
    Paused,
}

/// Invoked once per wake detection, never re-entrantly
#[async_trait]
pub trait WakeHandler: Send + Sync {
    /// Handle one wake event; runs the whole conversation session
    ///
    /// # Errors
    ///
    /// Errors are logged by the detector and never kill the detection loop
    async fn on_wake(&self) -> Result<()>;
}

/// Timing knobs for the detection loop
#[derive(Debug, Clone)]
pub struct WakeTiming {
    /// Idle wait between pause-flag checks while paused
    pub pause_poll: Duration,

    /// Backoff after an unexpected capture failure
    pub error_backoff: Duration,

    /// Bound on waiting for the loop task during `stop()`
    pub join_timeout: Duration,
}

impl Default for WakeTiming {
    fn default() -> Self {
        Self {
            pause_poll: Duration::from_millis(300),
            error_backoff: Duration::from_secs(1),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Watches for trigger phrases and fires the wake handler
pub struct WakeWordDetector {
    phrases: Vec<String>,
    trigger_timeout: Duration,
    timing: WakeTiming,
    capture: Arc<dyn SpeechCapture>,
    handler: Arc<dyn WakeHandler>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WakeWordDetector {
    /// Create a detector
    ///
    /// Phrases are normalized (lowercased, trimmed); the handler is fixed at
    /// construction so the detector's contract stays independent of what a
    /// session does.
    ///
    /// # Errors
    ///
    /// Returns error if no non-empty phrase is given
    pub fn new(
        phrases: Vec<String>,
        trigger_timeout: Duration,
        capture: Arc<dyn SpeechCapture>,
        handler: Arc<dyn WakeHandler>,
    ) -> Result<Self> {
        let normalized: Vec<String> = phrases
            .into_iter()
            .map(|p| p.to_lowercase().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if normalized.is_empty() {
            return Err(Error::Config("at least one wake phrase required".to_string()));
        }

        tracing::debug!(phrases = ?normalized, "wake word detector initialized");

        Ok(Self {
            phrases: normalized,
            trigger_timeout,
            timing: WakeTiming::default(),
            capture,
            handler,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        })
    }

    /// Override the detection loop timing
    #[must_use]
    pub fn with_timing(mut self, timing: WakeTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Start sampling in a background task
    ///
    /// A no-op (with a warning) if the detector is already running.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("wake word detector already running");
            return;
        }
        self.paused.store(false, Ordering::SeqCst);

        let loop_state = LoopState {
            phrases: self.phrases.clone(),
            trigger_timeout: self.trigger_timeout,
            timing: self.timing.clone(),
            capture: Arc::clone(&self.capture),
            handler: Arc::clone(&self.handler),
            running: Arc::clone(&self.running),
            paused: Arc::clone(&self.paused),
        };

        *self.task.lock().await = Some(tokio::spawn(loop_state.run()));
        tracing::info!(phrases = ?self.phrases, "wake word detector started");
    }

    /// Stop sampling and wait (bounded) for the loop task to finish
    ///
    /// After return no further wake handler invocation begins. If the loop
    /// does not exit within the join window it is detached and drains on its
    /// own; termination is then best-effort.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            // A session in flight may outlive the join window; the loop is
            // left to drain on its own rather than force-interrupted. It
            // observes the cleared running flag and exits without firing
            // another detection.
            if tokio::time::timeout(self.timing.join_timeout, handle)
                .await
                .is_err()
            {
                tracing::warn!("detection loop did not exit within join window, detaching");
            }
        }

        self.paused.store(false, Ordering::SeqCst);
        tracing::info!("wake word detector stopped");
    }

    /// Suspend sampling; idempotent
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume sampling; a no-op when not paused
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Current state, derived from the control flags
    #[must_use]
    pub fn state(&self) -> DetectorState {
        if !self.running.load(Ordering::SeqCst) {
            DetectorState::Idle
        } else if self.paused.load(Ordering::SeqCst) {
            DetectorState::Paused
        } else {
            DetectorState::Listening
        }
    }

    /// The normalized trigger phrases
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

/// Everything the detection loop owns after spawn
struct LoopState {
    phrases: Vec<String>,
    trigger_timeout: Duration,
    timing: WakeTiming,
    capture: Arc<dyn SpeechCapture>,
    handler: Arc<dyn WakeHandler>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl LoopState {
    async fn run(self) {
        while self.running.load(Ordering::SeqCst) {
            if self.paused.load(Ordering::SeqCst) {
                tokio::time::sleep(self.timing.pause_poll).await;
                continue;
            }

            match self
                .capture
                .listen_for_trigger(&self.phrases, self.trigger_timeout)
                .await
            {
                // Silence and non-matching speech both land here
                Ok(false) => {}
                Ok(true) => {
                    // Re-check: stop() or pause() may have raced the capture
                    if !self.running.load(Ordering::SeqCst) || self.paused.load(Ordering::SeqCst) {
                        continue;
                    }

                    tracing::info!("wake phrase detected");
                    self.paused.store(true, Ordering::SeqCst);
                    if let Err(e) = self.handler.on_wake().await {
                        tracing::error!(error = %e, "wake handler failed");
                    }
                    self.paused.store(false, Ordering::SeqCst);
                }
                Err(e) => {
                    tracing::error!(error = %e, "wake sampling failed");
                    tokio::time::sleep(self.timing.error_backoff).await;
                }
            }
        }
    }
}

/// Test a transcript against trigger phrases; first match wins
///
/// The transcript is normalized the same way configured phrases are, and the
/// match is containment, so "Hey Assistant, are you there?" triggers on
/// "hey assistant".
#[must_use]
pub fn matches_trigger<'a>(transcript: &str, phrases: &'a [String]) -> Option<&'a str> {
    let normalized = transcript.to_lowercase();
    let normalized = normalized.trim();
    phrases
        .iter()
        .map(String::as_str)
        .find(|phrase| normalized.contains(*phrase))
}
