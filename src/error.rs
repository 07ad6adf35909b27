//! Error types for the mirror gateway

use thiserror::Error;

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the mirror gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A capability the cycle depends on is absent (speech recognition,
    /// audio hardware). Terminal for the interaction cycle.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Speech recognition produced no usable utterance
    #[error("no utterance recognized")]
    NoMatch,

    /// `activate()` called while a cycle is already in flight
    #[error("interaction already active")]
    AlreadyActive,

    /// Frame source precondition failed (zero dimensions)
    #[error("frame source not ready: {0}")]
    SourceNotReady(String),

    /// Inference transport failure
    #[error("inference network error: {0}")]
    Network(String),

    /// Inference returned non-2xx or a malformed body
    #[error("inference server error: {0}")]
    ServerError(String),

    /// Inference did not complete within the configured deadline
    #[error("inference timed out after {0}ms")]
    Timeout(u64),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("recognizer error: {0}")]
    Recognizer(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Frame encoding error
    #[error("frame encode error: {0}")]
    Encode(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// True for failures on the vision path that degrade to the local
    /// fallback response rather than ending the cycle.
    #[must_use]
    pub fn degrades_to_fallback(&self) -> bool {
        matches!(
            self,
            Self::SourceNotReady(_)
                | Self::Network(_)
                | Self::ServerError(_)
                | Self::Timeout(_)
                | Self::Encode(_)
        )
    }
}
