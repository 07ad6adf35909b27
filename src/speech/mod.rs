//! Speech input
//!
//! Wraps a speech-recognition capability behind the [`SpeechCapture`] seam.
//! One activation yields at most one recognized utterance or one failure;
//! availability of the underlying capability is resolved once at startup.

mod capture;
mod recognizer;

pub use capture::{MicCapture, SAMPLE_RATE, UtteranceEndpointer, samples_to_wav};
pub use recognizer::{MicSpeechCapture, Transcriber};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single recognized spoken phrase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Recognized text
    pub text: String,
    /// When the recognition resolved
    pub captured_at: DateTime<Utc>,
}

impl Utterance {
    /// Create an utterance stamped with the current time
    #[must_use]
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            captured_at: Utc::now(),
        }
    }
}

/// Single-shot speech recognition
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Listen for one utterance
    ///
    /// Resolves at most once per call; platform events arriving after the
    /// first resolution are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatch`] when nothing usable was recognized and
    /// [`Error::CapabilityUnavailable`] when recognition cannot run at all.
    async fn listen_once(&self) -> Result<Utterance>;
}

/// Speech capability resolved once at startup
///
/// Callers hold this instead of probing the platform ad hoc; the unavailable
/// variant fails synchronously with the probe's reason.
#[derive(Clone)]
pub enum SpeechProvider {
    /// Recognition is available
    Available(Arc<dyn SpeechCapture>),
    /// Recognition cannot run on this host
    Unavailable {
        /// Why the capability probe failed
        reason: String,
    },
}

impl SpeechProvider {
    /// Listen for one utterance, or fail immediately if unavailable
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityUnavailable`] without suspending when the
    /// capability is absent; otherwise delegates to the wrapped capture.
    pub async fn listen_once(&self) -> Result<Utterance> {
        match self {
            Self::Available(capture) => capture.listen_once().await,
            Self::Unavailable { reason } => {
                Err(Error::CapabilityUnavailable(reason.clone()))
            }
        }
    }

    /// Whether the capability resolved as available
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// At-most-once resolution guard for callback-driven platform events
///
/// The first `settle()` returns true; every later call returns false and the
/// corresponding event must be dropped.
#[derive(Debug, Default)]
pub struct Settled(AtomicBool);

impl Settled {
    /// Create an unsettled guard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to settle; true exactly once
    pub fn settle(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    /// Whether a resolution has already been delivered
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capture that resolves with a fixed utterance
///
/// Backs the `ask` subcommand, where the question arrives typed rather than
/// spoken.
pub struct FixedUtterance {
    text: String,
}

impl FixedUtterance {
    /// Create a capture that will recognize `text`
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl SpeechCapture for FixedUtterance {
    async fn listen_once(&self) -> Result<Utterance> {
        if self.text.trim().is_empty() {
            return Err(Error::NoMatch);
        }
        Ok(Utterance::now(self.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_resolves_once() {
        let guard = Settled::new();
        assert!(!guard.is_settled());
        assert!(guard.settle());
        assert!(!guard.settle());
        assert!(guard.is_settled());
    }

    #[test]
    fn test_unavailable_provider_fails_synchronously() {
        let provider = SpeechProvider::Unavailable {
            reason: "no input device".to_string(),
        };
        assert!(!provider.is_available());
        assert!(matches!(
            tokio_test::block_on(provider.listen_once()),
            Err(Error::CapabilityUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fixed_utterance_resolves() {
        let capture = FixedUtterance::new("mirror on the wall");
        let utterance = capture.listen_once().await.unwrap();
        assert_eq!(utterance.text, "mirror on the wall");
    }

    #[tokio::test]
    async fn test_fixed_utterance_empty_is_no_match() {
        let capture = FixedUtterance::new("   ");
        assert!(matches!(capture.listen_once().await, Err(Error::NoMatch)));
    }
}
