//! Interaction session state
//!
//! One session owns exactly one [`InteractionState`] plus the generation
//! counter that invalidates async results from superseded cycles. State
//! transitions are the only legal mutation.

use serde::{Deserialize, Serialize};

use crate::speech::Utterance;

/// The six states of one interaction cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    /// Waiting for activation
    Idle,
    /// Speech capture in flight
    Listening,
    /// Deciding which path the utterance takes
    Evaluating,
    /// Still frame capture in flight
    CapturingFrame,
    /// Inference request in flight
    AwaitingInference,
    /// Narration streaming
    Responding,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for InteractionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Listening => write!(f, "Listening"),
            Self::Evaluating => write!(f, "Evaluating"),
            Self::CapturingFrame => write!(f, "CapturingFrame"),
            Self::AwaitingInference => write!(f, "AwaitingInference"),
            Self::Responding => write!(f, "Responding"),
        }
    }
}

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    /// Built by the local rule (non-trigger utterance or fallback)
    Local,
    /// Returned by the inference service
    Remote,
}

/// The text to be spoken and revealed, tagged by origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Response text
    pub text: String,
    /// Origin of the text
    pub source: ResponseSource,
}

impl ResponsePayload {
    /// Build a locally-ruled response
    #[must_use]
    pub fn local(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ResponseSource::Local,
        }
    }

    /// Build a response returned by inference
    #[must_use]
    pub fn remote(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: ResponseSource::Remote,
        }
    }
}

/// Aggregate root for one interaction cycle
///
/// Holds the active state, at most one in-flight utterance and response, and
/// the generation counter. Every transition bumps the generation; an async
/// result captured under an older generation must be discarded unapplied.
#[derive(Debug, Default)]
pub struct InteractionSession {
    state: InteractionState,
    generation: u64,
    utterance: Option<Utterance>,
    response: Option<ResponsePayload>,
}

impl InteractionSession {
    /// Create a session in `Idle` at generation zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.state
    }

    /// Current generation
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `generation` still tags the live cycle
    #[must_use]
    pub const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Transition to `new_state`, returning the new generation
    ///
    /// Logs the transition and invalidates every result captured under the
    /// previous generation.
    pub fn transition_to(&mut self, new_state: InteractionState) -> u64 {
        let old_state = self.state;
        self.state = new_state;
        self.generation += 1;

        if new_state == InteractionState::Idle {
            self.utterance = None;
            self.response = None;
        }

        tracing::info!(
            from = %old_state,
            to = %new_state,
            generation = self.generation,
            "state transition"
        );

        self.generation
    }

    /// Store the cycle's utterance if `generation` is still current
    ///
    /// Returns false (and stores nothing) for a stale result.
    pub fn store_utterance(&mut self, generation: u64, utterance: Utterance) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "discarding stale utterance"
            );
            return false;
        }
        self.utterance = Some(utterance);
        true
    }

    /// Store the cycle's response if `generation` is still current
    ///
    /// Returns false (and stores nothing) for a stale result.
    pub fn store_response(&mut self, generation: u64, response: ResponsePayload) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "discarding stale response"
            );
            return false;
        }
        self.response = Some(response);
        true
    }

    /// The in-flight utterance, if any
    #[must_use]
    pub fn utterance(&self) -> Option<&Utterance> {
        self.utterance.as_ref()
    }

    /// The in-flight response, if any
    #[must_use]
    pub fn response(&self) -> Option<&ResponsePayload> {
        self.response.as_ref()
    }
}
