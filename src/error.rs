//! Error types for the Parley assistant

use thiserror::Error;

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Parley assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech capture error (backend unreachable, device failure)
    ///
    /// Ordinary silence and unintelligible speech are *not* errors; they
    /// surface as `Ok(None)` from [`crate::speech::SpeechCapture::listen`].
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech output error
    #[error("speech error: {0}")]
    Speech(String),

    /// Knowledge retrieval error
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Answer generation error
    #[error("generation error: {0}")]
    Generation(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
