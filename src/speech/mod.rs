//! Speech capability surfaces
//!
//! The core never touches audio hardware directly. It talks to two traits:
//! [`SpeechCapture`] for transcribed input and [`SpeechOutput`] for spoken
//! responses. Silence and unintelligible speech are ordinary outcomes
//! (`Ok(None)`), never errors — errors mean the backend itself failed.

mod command;
mod console;

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::wake::matches_trigger;

pub use command::{CommandCapture, CommandSpeech};
pub use console::{ConsoleCapture, ConsoleOutput};

/// Max utterance duration for a wake-word sampling cycle
const TRIGGER_PHRASE_LIMIT: Duration = Duration::from_secs(4);

/// Captures speech and returns transcribed text
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Listen for one utterance and transcribe it
    ///
    /// Blocks up to `timeout` waiting for speech to begin and up to
    /// `phrase_limit` capturing it. Returns `Ok(None)` when nothing was
    /// heard or the speech was unintelligible.
    ///
    /// # Errors
    ///
    /// Returns error only when the capture backend itself fails
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Result<Option<String>>;

    /// Listen briefly and report whether a trigger phrase was heard
    ///
    /// Lighter-weight variant used by wake-word sampling. The default
    /// implementation captures one short utterance and tests normalized
    /// containment against every phrase.
    ///
    /// # Errors
    ///
    /// Returns error only when the capture backend itself fails
    async fn listen_for_trigger(&self, phrases: &[String], timeout: Duration) -> Result<bool> {
        let heard = self.listen(timeout, TRIGGER_PHRASE_LIMIT).await?;
        Ok(heard.is_some_and(|text| matches_trigger(&text, phrases).is_some()))
    }
}

/// Renders text as speech
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak the given text
    ///
    /// If `block` is true, returns only after playback completes. Empty or
    /// whitespace-only text is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the output backend fails
    async fn speak(&self, text: &str, block: bool) -> Result<()>;
}
