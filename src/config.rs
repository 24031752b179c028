//! Configuration for the Parley assistant
//!
//! Settings resolve in three layers: built-in defaults, an optional TOML
//! config file, then `PARLEY_*` environment variable overrides. The config
//! file is a partial overlay — every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::{Error, Result};

/// Default trigger phrases the assistant listens for
pub const DEFAULT_WAKE_PHRASES: &[&str] = &["hey assistant", "hey computer", "ok assistant"];

/// Default Ollama generate endpoint
pub const DEFAULT_GENERATOR_URL: &str = "http://localhost:11434/api/generate";

/// Default generation model
pub const DEFAULT_GENERATOR_MODEL: &str = "llama3.2";

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wake word detection settings
    pub wake: WakeConfig,

    /// Conversation session settings
    pub session: SessionConfig,

    /// Speech capture/output backends
    pub speech: SpeechConfig,

    /// Knowledge retrieval settings
    pub retrieval: RetrievalConfig,

    /// Answer generation settings
    pub generator: GeneratorConfig,

    /// Data directory (chunk index, logs)
    pub data_dir: PathBuf,
}

/// Wake word detection settings
#[derive(Debug, Clone)]
pub struct WakeConfig {
    /// Trigger phrases, matched by containment against normalized transcripts
    pub phrases: Vec<String>,

    /// How long each wake-word sampling cycle listens
    pub trigger_timeout_secs: u64,
}

impl WakeConfig {
    /// Per-cycle listen window for wake sampling
    #[must_use]
    pub const fn trigger_timeout(&self) -> Duration {
        Duration::from_secs(self.trigger_timeout_secs)
    }
}

/// Conversation session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Max seconds to wait for a question to begin
    pub question_timeout_secs: u64,

    /// Max seconds of a single question utterance to capture
    pub phrase_limit_secs: u64,

    /// Consecutive silent listen attempts before the session ends
    pub max_silences: u32,
}

impl SessionConfig {
    /// Listen window for follow-up questions
    #[must_use]
    pub const fn question_timeout(&self) -> Duration {
        Duration::from_secs(self.question_timeout_secs)
    }

    /// Max captured utterance duration
    #[must_use]
    pub const fn phrase_limit(&self) -> Duration {
        Duration::from_secs(self.phrase_limit_secs)
    }
}

/// Speech backend settings
///
/// Both backends are external commands so the core stays independent of any
/// particular audio stack. The capture command prints one transcript line to
/// stdout (nothing on silence); the speak command reads text from stdin.
#[derive(Debug, Clone, Default)]
pub struct SpeechConfig {
    /// Transcriber command and arguments (e.g. a whisper CLI wrapper)
    pub capture_command: Option<Vec<String>>,

    /// Synthesizer command and arguments (e.g. `espeak` or `say`)
    pub speak_command: Option<Vec<String>>,
}

/// Knowledge retrieval settings
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Path to the ingested chunk file (JSON array of chunks)
    pub chunks_file: Option<PathBuf>,

    /// Number of contexts fetched per query
    pub top_k: usize,
}

/// Answer generation settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Generate endpoint URL
    pub url: String,

    /// Model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeneratorConfig {
    /// Request timeout for generation calls
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake: WakeConfig {
                phrases: DEFAULT_WAKE_PHRASES.iter().map(ToString::to_string).collect(),
                trigger_timeout_secs: 3,
            },
            session: SessionConfig {
                question_timeout_secs: 8,
                phrase_limit_secs: 20,
                max_silences: 2,
            },
            speech: SpeechConfig::default(),
            retrieval: RetrievalConfig {
                chunks_file: None,
                top_k: 5,
            },
            generator: GeneratorConfig {
                url: DEFAULT_GENERATOR_URL.to_string(),
                model: DEFAULT_GENERATOR_MODEL.to_string(),
                timeout_secs: 120,
            },
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// # Errors
    ///
    /// Returns error if the config file exists but cannot be parsed
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path().as_deref())
    }

    /// Load configuration, overlaying the given TOML file if present
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let raw = std::fs::read_to_string(path)?;
                let file: ConfigFile = toml::from_str(&raw)?;
                config.apply_file(file);
                tracing::debug!(path = %path.display(), "loaded config file");
            } else {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
            }
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from a parsed config file
    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(phrases) = file.wake.phrases {
            self.wake.phrases = phrases;
        }
        if let Some(secs) = file.wake.trigger_timeout_secs {
            self.wake.trigger_timeout_secs = secs;
        }
        if let Some(secs) = file.session.question_timeout_secs {
            self.session.question_timeout_secs = secs;
        }
        if let Some(secs) = file.session.phrase_limit_secs {
            self.session.phrase_limit_secs = secs;
        }
        if let Some(n) = file.session.max_silences {
            self.session.max_silences = n;
        }
        if file.speech.capture_command.is_some() {
            self.speech.capture_command = file.speech.capture_command;
        }
        if file.speech.speak_command.is_some() {
            self.speech.speak_command = file.speech.speak_command;
        }
        if file.retrieval.chunks_file.is_some() {
            self.retrieval.chunks_file = file.retrieval.chunks_file;
        }
        if let Some(k) = file.retrieval.top_k {
            self.retrieval.top_k = k;
        }
        if let Some(url) = file.generator.url {
            self.generator.url = url;
        }
        if let Some(model) = file.generator.model {
            self.generator.model = model;
        }
        if let Some(secs) = file.generator.timeout_secs {
            self.generator.timeout_secs = secs;
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) {
        if let Ok(phrase) = std::env::var("PARLEY_WAKE_PHRASE") {
            if !phrase.trim().is_empty() {
                self.wake.phrases = vec![phrase];
            }
        }
        if let Ok(url) = std::env::var("PARLEY_GENERATOR_URL") {
            self.generator.url = url;
        }
        if let Ok(model) = std::env::var("PARLEY_GENERATOR_MODEL") {
            self.generator.model = model;
        }
        if let Ok(path) = std::env::var("PARLEY_CHUNKS_FILE") {
            self.retrieval.chunks_file = Some(PathBuf::from(path));
        }
    }

    /// Validate configuration invariants
    fn validate(&self) -> Result<()> {
        if self.wake.phrases.is_empty() {
            return Err(Error::Config("at least one wake phrase required".to_string()));
        }
        if self.session.max_silences == 0 {
            return Err(Error::Config("session.max_silences must be at least 1".to_string()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Default data directory (`~/.local/share/parley` on Linux)
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "parley", "parley")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
}

/// Default config file path (`~/.config/parley/config.toml` on Linux)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "parley", "parley")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Top-level TOML configuration file schema
///
/// All fields are optional — the file is a partial overlay on top of defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    wake: WakeFileConfig,

    #[serde(default)]
    session: SessionFileConfig,

    #[serde(default)]
    speech: SpeechFileConfig,

    #[serde(default)]
    retrieval: RetrievalFileConfig,

    #[serde(default)]
    generator: GeneratorFileConfig,

    data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct WakeFileConfig {
    phrases: Option<Vec<String>>,
    trigger_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionFileConfig {
    question_timeout_secs: Option<u64>,
    phrase_limit_secs: Option<u64>,
    max_silences: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeechFileConfig {
    capture_command: Option<Vec<String>>,
    speak_command: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RetrievalFileConfig {
    chunks_file: Option<PathBuf>,
    top_k: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct GeneratorFileConfig {
    url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}
