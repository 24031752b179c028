//! Console-backed speech capabilities
//!
//! Typed input stands in for the microphone and printed output for the
//! speaker. Used by console mode and handy when no audio stack is around.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::speech::{SpeechCapture, SpeechOutput};
use crate::{Error, Result};

/// Reads "utterances" as lines from stdin
pub struct ConsoleCapture {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleCapture {
    /// Create a capture backed by this process's stdin
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for ConsoleCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechCapture for ConsoleCapture {
    async fn listen(&self, timeout: Duration, _phrase_limit: Duration) -> Result<Option<String>> {
        let mut lines = self.lines.lock().await;

        match tokio::time::timeout(timeout, lines.next_line()).await {
            // No input within the window is ordinary silence
            Err(_) => Ok(None),
            Ok(Ok(Some(line))) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line))
                }
            }
            Ok(Ok(None)) => Err(Error::Capture("stdin closed".to_string())),
            Ok(Err(e)) => Err(Error::Capture(format!("stdin read failed: {e}"))),
        }
    }
}

/// Prints responses instead of speaking them
pub struct ConsoleOutput;

#[async_trait]
impl SpeechOutput for ConsoleOutput {
    async fn speak(&self, text: &str, _block: bool) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        println!("Assistant: {text}");
        Ok(())
    }
}
