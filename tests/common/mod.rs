//! Shared test doubles for the conversation core
//!
//! Scripted capabilities let the detector and session loops run without any
//! audio hardware or backends: each capture call consumes the next scripted
//! step, and every spoken utterance is recorded for assertions.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley::speech::{SpeechCapture, SpeechOutput};
use parley::{Error, Generator, Result, RetrievedContext, Retriever, SourceType};

/// Poll a condition until it holds or the deadline passes
pub async fn wait_for(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// One scripted outcome of a capture call
pub enum Heard {
    /// Nothing understood within the window
    Silence,
    /// A transcript
    Text(&'static str),
    /// The capture backend failed
    Fail,
}

/// Capture that replays a fixed script, then reports silence forever
pub struct ScriptedCapture {
    script: Mutex<VecDeque<Heard>>,
}

impl ScriptedCapture {
    pub fn new(script: Vec<Heard>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn listen(&self, _timeout: Duration, _phrase_limit: Duration) -> Result<Option<String>> {
        let step = self.script.lock().await.pop_front();
        match step {
            Some(Heard::Text(text)) => Ok(Some(text.to_string())),
            Some(Heard::Silence) => Ok(None),
            Some(Heard::Fail) => Err(Error::Capture("scripted failure".to_string())),
            None => {
                // Script exhausted: behave like an idle microphone without
                // busy-spinning the detector loop.
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(None)
            }
        }
    }
}

/// Speech output that records every utterance instead of playing audio
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: StdMutex<Vec<String>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything spoken so far, in order
    pub fn utterances(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechOutput for RecordingSpeech {
    async fn speak(&self, text: &str, _block: bool) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Build a context passage with the given word count
pub fn context_with_words(words: usize) -> RetrievedContext {
    RetrievedContext {
        text: vec!["word"; words].join(" "),
        source: "test-source".to_string(),
        source_type: SourceType::Pdf,
    }
}

/// Retriever returning a canned result
pub struct CannedRetriever {
    contexts: Option<Vec<RetrievedContext>>,
}

impl CannedRetriever {
    /// Always returns these contexts
    pub fn with_contexts(contexts: Vec<RetrievedContext>) -> Self {
        Self {
            contexts: Some(contexts),
        }
    }

    /// Always raises
    pub fn failing() -> Self {
        Self { contexts: None }
    }
}

#[async_trait]
impl Retriever for CannedRetriever {
    async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<RetrievedContext>> {
        match &self.contexts {
            Some(contexts) => Ok(contexts.iter().take(top_k).cloned().collect()),
            None => Err(Error::Retrieval("canned retrieval failure".to_string())),
        }
    }
}

/// Generator that labels which path answered
#[derive(Default)]
pub struct CannedGenerator {
    calls: StdMutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call labels in order: "general" or "grounded(N)"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, _question: &str) -> String {
        self.calls.lock().unwrap().push("general".to_string());
        "a general answer".to_string()
    }

    async fn generate_with_context(
        &self,
        _question: &str,
        contexts: &[RetrievedContext],
    ) -> String {
        self.calls
            .lock()
            .unwrap()
            .push(format!("grounded({})", contexts.len()));
        "a grounded answer".to_string()
    }
}
