//! Parley - voice-activated query assistant
//!
//! Parley waits for a trigger phrase, captures a spoken question, routes it
//! to either a knowledge-grounded answer or a general-knowledge answer,
//! speaks the result, and returns to waiting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  WakeWordDetector                    │
//! │      background sampling, pause/resume protocol      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ on wake (detector self-pauses)
//! ┌────────────────────▼────────────────────────────────┐
//! │                  SessionManager                      │
//! │        listen → route → answer → speak turns         │
//! └────────────────────┬────────────────────────────────┘
//!                      │ per question
//! ┌────────────────────▼────────────────────────────────┐
//! │            QueryRouter + Pipeline                    │
//! │  system commands │ grounded answers │ general        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Speech capture/output, retrieval, and generation are capabilities behind
//! traits; the built-in implementations (console, subprocess, chunk index,
//! Ollama) live next to them.

pub mod assistant;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod retrieval;
pub mod router;
pub mod session;
pub mod speech;
pub mod wake;

pub use assistant::Assistant;
pub use config::Config;
pub use error::{Error, Result};
pub use generate::{Generator, OllamaGenerator};
pub use pipeline::{Answer, Pipeline};
pub use retrieval::{ChunkRetriever, RetrievedContext, Retriever, SourceType};
pub use router::{QueryRouter, RouteDecision, SystemCommand};
pub use session::{SessionManager, SessionState};
pub use speech::{SpeechCapture, SpeechOutput};
pub use wake::{DetectorState, WakeHandler, WakeTiming, WakeWordDetector};
