//! Interaction orchestration
//!
//! Sequences one interaction cycle across the speech, vision, inference, and
//! narration seams: idle → listening → evaluating → (capturing frame →
//! awaiting inference) → responding → idle. The four asynchronous boundaries
//! are strictly sequential within a cycle; results from a superseded cycle
//! are invalidated by the session's generation counter and never applied.

mod state;

pub use state::{InteractionSession, InteractionState, ResponsePayload, ResponseSource};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;

use crate::events::{EventBus, MirrorEvent};
use crate::flourish::{FlourishIntensity, FlourishTrigger};
use crate::inference::Inference;
use crate::narrator::Narrator;
use crate::speech::{SpeechProvider, Utterance};
use crate::trigger::TriggerMatcher;
use crate::vision::{FrameSampler, FrameSource};
use crate::{Error, Result};

/// Default reply for utterances outside the mirror's domain
pub const DEFAULT_LOCAL_REPLY: &str = "I only answer magic mirror questions!";

/// Default reply when the vision path fails
pub const DEFAULT_FALLBACK_REPLY: &str = "The mirror's vision is clouded right now.";

/// Default trigger phrase
pub const DEFAULT_TRIGGER_PHRASE: &str = "mirror on the wall";

/// Tunables for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Phrase routing an utterance to the vision path
    pub trigger_phrase: String,
    /// Reply for non-trigger utterances
    pub local_reply: String,
    /// Reply substituted for any vision-path failure
    pub fallback_reply: String,
    /// Pacing floor between evaluating and the branch target; zero in tests
    pub processing_delay: Duration,
    /// Intensity of the completion flourish
    pub flourish: FlourishIntensity,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
            local_reply: DEFAULT_LOCAL_REPLY.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            processing_delay: Duration::from_secs(2),
            flourish: FlourishIntensity::Global,
        }
    }
}

/// Drives interaction cycles over the injected component seams
pub struct Orchestrator {
    session: Mutex<InteractionSession>,
    speech: SpeechProvider,
    source: Arc<dyn FrameSource>,
    sampler: FrameSampler,
    inference: Arc<dyn Inference>,
    narrator: Narrator,
    flourish: FlourishTrigger,
    events: EventBus,
    trigger: TriggerMatcher,
    processing_delay: Duration,
    local_reply: String,
    fallback_reply: String,
    flourish_intensity: FlourishIntensity,
}

impl Orchestrator {
    /// Wire an orchestrator from its components
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        speech: SpeechProvider,
        source: Arc<dyn FrameSource>,
        sampler: FrameSampler,
        inference: Arc<dyn Inference>,
        narrator: Narrator,
        events: EventBus,
    ) -> Self {
        Self {
            session: Mutex::new(InteractionSession::new()),
            speech,
            source,
            sampler,
            inference,
            narrator,
            flourish: FlourishTrigger::new(events.clone()),
            events,
            trigger: TriggerMatcher::new(&config.trigger_phrase),
            processing_delay: config.processing_delay,
            local_reply: config.local_reply,
            fallback_reply: config.fallback_reply,
            flourish_intensity: config.flourish,
        }
    }

    /// Current interaction state
    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.session
            .lock()
            .map(|s| s.state())
            .unwrap_or(InteractionState::Idle)
    }

    /// The event surface the presentation layer subscribes to
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run one interaction cycle
    ///
    /// Rejected with [`Error::AlreadyActive`] (state unchanged) unless the
    /// session is `Idle`. The session always ends a cycle back in `Idle`.
    ///
    /// # Errors
    ///
    /// Returns the speech failure when capture fails — that path produces no
    /// spoken output. Vision-path failures are not errors; they degrade to
    /// the fallback reply.
    pub async fn activate(&self) -> Result<()> {
        let generation = self.begin()?;
        self.run_cycle(generation).await
    }

    /// Guarded entry: `Idle` → `Listening`
    fn begin(&self) -> Result<u64> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Config("session lock poisoned".to_string()))?;

        if session.state() != InteractionState::Idle {
            tracing::warn!(state = %session.state(), "activation rejected while mid-cycle");
            return Err(Error::AlreadyActive);
        }

        let generation = session.transition_to(InteractionState::Listening);
        drop(session);

        self.events.publish(MirrorEvent::StateChanged {
            state: InteractionState::Listening,
        });
        Ok(generation)
    }

    async fn run_cycle(&self, generation: u64) -> Result<()> {
        let utterance = match self.speech.listen_once().await {
            Ok(utterance) => utterance,
            Err(e) => {
                tracing::warn!(error = %e, "speech capture failed, ending cycle");
                self.abort_to_idle(generation);
                return Err(e);
            }
        };

        let Some(generation) = self.apply_utterance(generation, utterance.clone()) else {
            return Ok(());
        };

        // Pacing floor, not a semantic requirement
        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }
        if !self.is_current(generation) {
            return Ok(());
        }

        let (generation, response) = if self.trigger.matches(&utterance.text) {
            match self.vision_path(generation).await {
                Some(outcome) => outcome,
                None => return Ok(()),
            }
        } else {
            tracing::info!(utterance = %utterance.text, "utterance outside the mirror's domain");
            (generation, ResponsePayload::local(&self.local_reply))
        };

        let Some(generation) = self.apply_response(generation, response.clone()) else {
            return Ok(());
        };

        self.stream_reveals(generation, &response).await;

        let Some(_generation) = self.guarded_transition(generation, InteractionState::Idle)
        else {
            return Ok(());
        };
        self.flourish.fire(self.flourish_intensity);
        Ok(())
    }

    /// Vision path: frame capture then inference, each failure substituting
    /// the fallback reply. `None` means the cycle was superseded.
    async fn vision_path(&self, generation: u64) -> Option<(u64, ResponsePayload)> {
        let generation = self.guarded_transition(generation, InteractionState::CapturingFrame)?;

        let frame = match self.sampler.capture_frame(self.source.as_ref()).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "frame capture failed, substituting fallback reply");
                if !self.is_current(generation) {
                    return None;
                }
                return Some((generation, ResponsePayload::local(&self.fallback_reply)));
            }
        };
        if !self.is_current(generation) {
            return None;
        }

        let generation =
            self.guarded_transition(generation, InteractionState::AwaitingInference)?;

        match self.inference.submit(&frame).await {
            Ok(text) => {
                if !self.is_current(generation) {
                    return None;
                }
                Some((generation, ResponsePayload::remote(text)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "inference failed, substituting fallback reply");
                if !self.is_current(generation) {
                    return None;
                }
                Some((generation, ResponsePayload::local(&self.fallback_reply)))
            }
        }
    }

    /// Drive the narrator, republishing reveal events while current
    async fn stream_reveals(&self, generation: u64, response: &ResponsePayload) {
        let mut reveals = self.narrator.narrate(response).await;

        while let Some(event) = reveals.next().await {
            if !self.is_current(generation) {
                tracing::debug!("discarding reveal from superseded cycle");
                return;
            }
            self.events.publish(MirrorEvent::Reveal { event });
        }
    }

    /// Store the utterance and enter `Evaluating` if still current
    fn apply_utterance(&self, generation: u64, utterance: Utterance) -> Option<u64> {
        let new_generation = {
            let mut session = self.session.lock().ok()?;
            if !session.store_utterance(generation, utterance.clone()) {
                return None;
            }
            session.transition_to(InteractionState::Evaluating)
        };

        self.events
            .publish(MirrorEvent::UtteranceRecognized { utterance });
        self.events.publish(MirrorEvent::StateChanged {
            state: InteractionState::Evaluating,
        });
        Some(new_generation)
    }

    /// Store the response and enter `Responding` if still current
    fn apply_response(&self, generation: u64, response: ResponsePayload) -> Option<u64> {
        let new_generation = {
            let mut session = self.session.lock().ok()?;
            if !session.store_response(generation, response) {
                return None;
            }
            session.transition_to(InteractionState::Responding)
        };

        self.events.publish(MirrorEvent::StateChanged {
            state: InteractionState::Responding,
        });
        Some(new_generation)
    }

    /// Transition if `captured` still tags the live cycle
    fn guarded_transition(&self, captured: u64, new_state: InteractionState) -> Option<u64> {
        let new_generation = {
            let mut session = self.session.lock().ok()?;
            if !session.is_current(captured) {
                tracing::debug!(
                    stale = captured,
                    current = session.generation(),
                    "discarding stale transition"
                );
                return None;
            }
            session.transition_to(new_state)
        };

        self.events
            .publish(MirrorEvent::StateChanged { state: new_state });
        Some(new_generation)
    }

    /// Return to `Idle` after a failed capture; no output follows
    fn abort_to_idle(&self, generation: u64) {
        let _ = self.guarded_transition(generation, InteractionState::Idle);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session
            .lock()
            .map(|s| s.is_current(generation))
            .unwrap_or(false)
    }
}
