//! Subprocess-backed speech capabilities
//!
//! Delegates capture and synthesis to external commands so the core stays
//! independent of any particular audio stack. The transcriber command prints
//! one transcript line to stdout (nothing on silence); the synthesizer
//! command reads the text to speak from stdin (e.g. `espeak` or `say`).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::speech::{SpeechCapture, SpeechOutput};
use crate::{Error, Result};

/// Runs an external transcriber command per listen cycle
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    /// Create a capture from a command line (program plus arguments)
    ///
    /// # Errors
    ///
    /// Returns error if the command line is empty
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Config("speech.capture_command is empty".to_string()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl SpeechCapture for CommandCapture {
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> Result<Option<String>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("PARLEY_LISTEN_TIMEOUT_SECS", timeout.as_secs().to_string())
            .env("PARLEY_PHRASE_LIMIT_SECS", phrase_limit.as_secs().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Capture(format!("failed to spawn {}: {e}", self.program)))?;

        // Outer bound: the command gets the full listen window plus capture
        // time, then is killed and the cycle counts as silence.
        let window = timeout + phrase_limit;
        let output = match tokio::time::timeout(window, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| Error::Capture(e.to_string()))?,
            Err(_) => {
                tracing::debug!(program = %self.program, "transcriber exceeded listen window");
                return Ok(None);
            }
        };

        if !output.status.success() {
            return Err(Error::Capture(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            Ok(None)
        } else {
            tracing::debug!(transcript = %transcript, "transcribed");
            Ok(Some(transcript))
        }
    }
}

/// Feeds text to an external synthesizer command
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    /// Create a speech output from a command line (program plus arguments)
    ///
    /// # Errors
    ///
    /// Returns error if the command line is empty
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Config("speech.speak_command is empty".to_string()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    async fn run(program: String, args: Vec<String>, text: String) -> Result<()> {
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Speech(format!("failed to spawn {program}: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| Error::Speech(e.to_string()))?;
            drop(stdin);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Speech(e.to_string()))?;

        if !status.success() {
            return Err(Error::Speech(format!("{program} exited with {status}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeech {
    async fn speak(&self, text: &str, block: bool) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        tracing::debug!(chars = text.len(), block, "speaking");
        let program = self.program.clone();
        let args = self.args.clone();
        let text = text.to_string();

        if block {
            Self::run(program, args, text).await
        } else {
            tokio::spawn(async move {
                if let Err(e) = Self::run(program, args, text).await {
                    tracing::error!(error = %e, "background speech failed");
                }
            });
            Ok(())
        }
    }
}
