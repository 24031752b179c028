//! Conversation sessions
//!
//! One session runs from a wake detection until the user says goodbye or
//! falls silent twice in a row: listen for a question, answer it, speak the
//! answer, repeat. Speech output blocks before the next turn so the next
//! utterance is never captured mid-response.

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::pipeline::{Answer, Pipeline};
use crate::speech::{SpeechCapture, SpeechOutput};
use crate::Result;

/// Spoken after a silent listen attempt, while attempts remain
pub const REPROMPT: &str = "I didn't hear anything. I'm still listening.";

/// Spoken when the user asks to end the session
pub const SIGN_OFF: &str = "Okay, going back to sleep. Say the wake word when you need me.";

/// Spoken when the session ends on the silence threshold
pub const SILENCE_FALLBACK: &str = "I'll go back to listening for the wake word.";

/// Spoken when a turn faults; the session then ends
pub const SESSION_APOLOGY: &str = "Sorry, something went wrong. Please try again.";

/// State of one conversation, owned exclusively by the session loop
#[derive(Debug, Clone, Copy)]
pub struct SessionState {
    /// Whether the loop should keep taking turns
    pub active: bool,

    /// Silent listen attempts since the last successful transcript
    pub consecutive_silences: u32,
}

impl SessionState {
    /// Fresh state for a new session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: true,
            consecutive_silences: 0,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs wake-triggered conversations
pub struct SessionManager {
    capture: Arc<dyn SpeechCapture>,
    speech: Arc<dyn SpeechOutput>,
    pipeline: Arc<Pipeline>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a session manager
    ///
    /// `capture` is the same instance the wake detector samples; the
    /// pause/resume protocol guarantees the two never use it concurrently.
    #[must_use]
    pub fn new(
        capture: Arc<dyn SpeechCapture>,
        speech: Arc<dyn SpeechOutput>,
        pipeline: Arc<Pipeline>,
        config: SessionConfig,
    ) -> Self {
        Self {
            capture,
            speech,
            pipeline,
            config,
        }
    }

    /// Run one conversation session to completion
    ///
    /// Precondition: wake detection is paused and an acknowledgment has been
    /// spoken. Any fault during a turn is caught here, logged, and converted
    /// into a spoken apology; the session then ends rather than retrying.
    pub async fn run_session(&self) {
        tracing::info!("session started");

        if let Err(e) = self.converse().await {
            tracing::error!(error = %e, "session fault");
            if let Err(e) = self.speech.speak(SESSION_APOLOGY, true).await {
                tracing::error!(error = %e, "failed to speak session apology");
            }
        }

        tracing::info!("session ended");
    }

    /// The turn loop; faults propagate to the session boundary
    async fn converse(&self) -> Result<()> {
        let mut state = SessionState::new();

        while state.active && state.consecutive_silences < self.config.max_silences {
            let heard = self
                .capture
                .listen(self.config.question_timeout(), self.config.phrase_limit())
                .await?;

            let Some(question) = heard else {
                state.consecutive_silences += 1;
                tracing::debug!(
                    silences = state.consecutive_silences,
                    "no speech within question window"
                );
                if state.consecutive_silences < self.config.max_silences {
                    self.speech.speak(REPROMPT, true).await?;
                }
                continue;
            };

            state.consecutive_silences = 0;
            tracing::info!(question = %question, "question received");

            match self.pipeline.answer(&question).await {
                Answer::Exit => {
                    self.speech.speak(SIGN_OFF, true).await?;
                    return Ok(());
                }
                Answer::Reply(text) => {
                    // Block until playback finishes so the next listen does
                    // not capture our own voice.
                    self.speech.speak(&text, true).await?;
                }
            }
        }

        if state.consecutive_silences >= self.config.max_silences {
            self.speech.speak(SILENCE_FALLBACK, true).await?;
        }

        Ok(())
    }
}
