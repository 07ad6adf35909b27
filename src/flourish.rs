//! Cosmetic completion signal
//!
//! Decoupled from interaction logic: firing is best-effort and failures are
//! swallowed. Nothing downstream of a flourish affects the session.

use serde::{Deserialize, Serialize};

use crate::events::{EventBus, MirrorEvent};

/// How wide the visual flourish should spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlourishIntensity {
    /// Around the response area only
    Local,
    /// Across the whole surface
    Global,
}

impl std::fmt::Display for FlourishIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// Fires cosmetic completion signals toward the presentation layer
#[derive(Clone)]
pub struct FlourishTrigger {
    events: EventBus,
}

impl FlourishTrigger {
    /// Create a trigger publishing on `events`
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Fire a flourish; fire-and-forget
    pub fn fire(&self, intensity: FlourishIntensity) {
        tracing::debug!(%intensity, "flourish fired");
        self.events.publish(MirrorEvent::Flourish { intensity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_publishes_intensity() {
        let events = EventBus::new(8);
        let mut rx = events.subscribe();
        let trigger = FlourishTrigger::new(events);

        trigger.fire(FlourishIntensity::Global);

        match rx.try_recv().unwrap() {
            MirrorEvent::Flourish { intensity } => {
                assert_eq!(intensity, FlourishIntensity::Global);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_fire_without_subscribers_is_swallowed() {
        let trigger = FlourishTrigger::new(EventBus::new(8));
        // Must not panic or error with nobody listening
        trigger.fire(FlourishIntensity::Local);
    }
}
