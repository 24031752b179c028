//! Assistant orchestration
//!
//! [`Assistant`] is the explicitly constructed context that wires the wake
//! detector, session manager, and answer pipeline together. The process
//! entry point builds one and passes capabilities in; there is no ambient
//! global state.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::generate::Generator;
use crate::pipeline::{Answer, Pipeline};
use crate::retrieval::Retriever;
use crate::router::QueryRouter;
use crate::session::SessionManager;
use crate::speech::{SpeechCapture, SpeechOutput};
use crate::wake::{DetectorState, WakeHandler, WakeTiming, WakeWordDetector};
use crate::Result;

/// Spoken immediately after a wake detection
pub const ACKNOWLEDGMENT: &str = "Yes, I'm listening.";

/// Spoken when the assistant shuts down
pub const GOODBYE: &str = "Goodbye! Voice assistant shutting down.";

/// Console-mode inputs that end the loop
const CONSOLE_EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

/// The voice assistant: wake detection plus turn-taking conversations
pub struct Assistant {
    speech: Arc<dyn SpeechOutput>,
    pipeline: Arc<Pipeline>,
    detector: WakeWordDetector,
    greeting: String,
}

/// Wake handler that acknowledges and runs one session
struct SessionRunner {
    speech: Arc<dyn SpeechOutput>,
    session: SessionManager,
}

#[async_trait]
impl WakeHandler for SessionRunner {
    async fn on_wake(&self) -> Result<()> {
        self.speech.speak(ACKNOWLEDGMENT, true).await?;
        // Faults inside the session are handled at its own boundary
        self.session.run_session().await;
        Ok(())
    }
}

impl Assistant {
    /// Build an assistant from configuration and capabilities
    ///
    /// The capture instance is shared between wake sampling and sessions;
    /// the detector's pause protocol keeps the two from using it at once.
    /// Pass `None` for the retriever to run without a knowledge base.
    ///
    /// # Errors
    ///
    /// Returns error if no wake phrase is configured
    pub fn new(
        config: &Config,
        capture: Arc<dyn SpeechCapture>,
        speech: Arc<dyn SpeechOutput>,
        retriever: Option<Arc<dyn Retriever>>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let router = QueryRouter::new(retriever, config.retrieval.top_k);
        let pipeline = Arc::new(Pipeline::new(router, generator));

        let session = SessionManager::new(
            Arc::clone(&capture),
            Arc::clone(&speech),
            Arc::clone(&pipeline),
            config.session.clone(),
        );

        let handler = Arc::new(SessionRunner {
            speech: Arc::clone(&speech),
            session,
        });

        let detector = WakeWordDetector::new(
            config.wake.phrases.clone(),
            config.wake.trigger_timeout(),
            capture,
            handler,
        )?;

        let greeting = format!(
            "Voice assistant is ready. Say '{}' to begin.",
            detector.phrases()[0]
        );

        Ok(Self {
            speech,
            pipeline,
            detector,
            greeting,
        })
    }

    /// Override the wake detection loop timing
    #[must_use]
    pub fn with_wake_timing(mut self, timing: WakeTiming) -> Self {
        self.detector = self.detector.with_timing(timing);
        self
    }

    /// Greet the user and start listening for wake phrases
    ///
    /// # Errors
    ///
    /// Returns error if the greeting cannot be spoken
    pub async fn start(&self) -> Result<()> {
        self.speech.speak(&self.greeting, true).await?;
        self.detector.start().await;
        tracing::info!("assistant is live and listening for wake phrases");
        Ok(())
    }

    /// Stop wake detection (bounded) and say goodbye
    pub async fn shutdown(&self) {
        self.detector.stop().await;
        if let Err(e) = self.speech.speak(GOODBYE, true).await {
            tracing::error!(error = %e, "failed to speak goodbye");
        }
        tracing::info!("assistant stopped");
    }

    /// Current wake detector state
    #[must_use]
    pub fn detector_state(&self) -> DetectorState {
        self.detector.state()
    }

    /// Answer a single question (console front-ends, tests)
    pub async fn answer(&self, question: &str) -> Answer {
        self.pipeline.answer(question).await
    }

    /// Run a typed conversation loop on stdin until the user exits
    ///
    /// # Errors
    ///
    /// Returns error if stdin cannot be read
    pub async fn run_console(&self) -> Result<()> {
        println!("Type your questions (type 'exit' to quit)\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("You: ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if CONSOLE_EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
                println!("Goodbye!");
                break;
            }

            match self.pipeline.answer(input).await {
                Answer::Exit => {
                    println!("Goodbye!");
                    break;
                }
                Answer::Reply(text) => {
                    self.speech.speak(&text, true).await?;
                }
            }
        }

        Ok(())
    }
}
