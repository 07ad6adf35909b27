//! UI event surface
//!
//! The presentation layer subscribes here; the core never touches rendering
//! directly. Publishing is best-effort — a lagging or absent subscriber never
//! propagates an error into the interaction cycle.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::flourish::FlourishIntensity;
use crate::narrator::RevealEvent;
use crate::orchestrator::InteractionState;
use crate::speech::Utterance;

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 64;

/// Events published toward the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MirrorEvent {
    /// The session entered a new state
    StateChanged {
        /// The state entered
        state: InteractionState,
    },

    /// Speech capture resolved; lets the UI show "You said: …"
    UtteranceRecognized {
        /// The recognized utterance
        utterance: Utterance,
    },

    /// One step of the response reveal
    Reveal {
        /// The reveal step
        event: RevealEvent,
    },

    /// Cosmetic completion signal
    Flourish {
        /// How wide the flourish spreads
        intensity: FlourishIntensity,
    },
}

/// Broadcast bus carrying [`MirrorEvent`]s to subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MirrorEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the event stream
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.tx.subscribe()
    }

    /// Publish an event (best-effort, never fails)
    pub fn publish(&self, event: MirrorEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
