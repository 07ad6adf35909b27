//! Response narration
//!
//! Turns a response into a finite pull-based stream of reveal events paced
//! against the spoken rendering of the same text. Word boundaries drive
//! prefix growth; when synthesis is unavailable the narrator degrades to a
//! single final event instead of failing.

mod playback;
mod synthesis;

pub use playback::{SpeakerPlayback, decode_mp3};
pub use synthesis::HttpSynthesizer;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, stream};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::orchestrator::ResponsePayload;

/// One step of progressively revealing response text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealEvent {
    /// Prefix of the response text revealed so far
    pub revealed_prefix: String,
    /// True exactly once, on the event whose prefix is the full text
    pub is_final: bool,
}

/// Finite stream of reveal events for one narration pass
pub type RevealStream = Pin<Box<dyn Stream<Item = RevealEvent> + Send>>;

/// Synthesized audio ready for playback
#[derive(Debug, Clone)]
pub struct SpokenAudio {
    /// Mono f32 samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SpokenAudio {
    /// Playback duration of the audio
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        #[allow(clippy::cast_precision_loss)]
        let seconds = self.samples.len() as f64 / f64::from(self.sample_rate);
        Duration::from_secs_f64(seconds)
    }
}

/// Audible rendering of response text
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Synthesize `text` into playable audio
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str) -> Result<SpokenAudio>;

    /// Play synthesized audio to completion
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    async fn play(&self, audio: &SpokenAudio) -> Result<()>;
}

/// Synthesis capability resolved once at startup
#[derive(Clone)]
pub enum SynthesisProvider {
    /// Synthesis and playback are available
    Available(Arc<dyn SpeechSynthesis>),
    /// No audible rendering on this host
    Unavailable {
        /// Why the capability probe failed
        reason: String,
    },
}

impl SynthesisProvider {
    /// Whether the capability resolved as available
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Paces reveal events against spoken output
pub struct Narrator {
    synthesis: SynthesisProvider,
}

impl Narrator {
    /// Create a narrator over the given synthesis capability
    #[must_use]
    pub fn new(synthesis: SynthesisProvider) -> Self {
        Self { synthesis }
    }

    /// Narrate one response
    ///
    /// Synthesizes the text, starts playback (best-effort, fire-and-forget),
    /// and returns the paced reveal stream. Each payload gets exactly one
    /// narration pass; the returned stream is finite and not restartable.
    /// Without synthesis the stream holds a single final event.
    pub async fn narrate(&self, payload: &ResponsePayload) -> RevealStream {
        let text = payload.text.clone();

        let audio = match &self.synthesis {
            SynthesisProvider::Unavailable { reason } => {
                tracing::debug!(reason = %reason, "synthesis unavailable, revealing all at once");
                return single_final(text);
            }
            SynthesisProvider::Available(synth) => match synth.synthesize(&text).await {
                Ok(audio) => audio,
                Err(e) => {
                    tracing::warn!(error = %e, "synthesis failed, revealing all at once");
                    return single_final(text);
                }
            },
        };

        let schedule = BoundarySchedule::for_text(&text, audio.duration());

        if let SynthesisProvider::Available(synth) = &self.synthesis {
            let synth = Arc::clone(synth);
            tokio::spawn(async move {
                if let Err(e) = synth.play(&audio).await {
                    tracing::warn!(error = %e, "speech playback failed");
                }
            });
        }

        paced_stream(text, schedule)
    }
}

/// One pacing step: wait `delay`, then reveal up to `prefix_len` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    delay: Duration,
    prefix_len: usize,
}

/// Word-boundary schedule apportioning the audio duration over the text
#[derive(Debug, Clone)]
struct BoundarySchedule {
    steps: Vec<Step>,
}

impl BoundarySchedule {
    /// Build the schedule for `text` spoken over `total`
    ///
    /// Each boundary's share of the duration is proportional to the text it
    /// reveals, mirroring how boundary events track spoken progress.
    fn for_text(text: &str, total: Duration) -> Self {
        let boundaries = word_boundaries(text);
        let text_len = text.len().max(1);

        let mut steps = Vec::with_capacity(boundaries.len());
        let mut prev = 0usize;
        for boundary in boundaries {
            #[allow(clippy::cast_precision_loss)]
            let share = (boundary - prev) as f64 / text_len as f64;
            steps.push(Step {
                delay: total.mul_f64(share),
                prefix_len: boundary,
            });
            prev = boundary;
        }

        Self { steps }
    }
}

/// Byte offsets at the end of each word, always terminated by `text.len()`
///
/// Offsets are strictly increasing, so the resulting prefixes are strictly
/// growing and the last one is the whole text.
fn word_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut in_word = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                boundaries.push(idx);
                in_word = false;
            }
        } else {
            in_word = true;
        }
    }

    if boundaries.last() != Some(&text.len()) {
        boundaries.push(text.len());
    }

    boundaries
}

/// Stream the schedule's prefixes, one per boundary
fn paced_stream(text: String, schedule: BoundarySchedule) -> RevealStream {
    let steps = schedule.steps.into_iter();
    Box::pin(stream::unfold((text, steps), |(text, mut steps)| async move {
        let step = steps.next()?;
        tokio::time::sleep(step.delay).await;

        let event = RevealEvent {
            revealed_prefix: text[..step.prefix_len].to_string(),
            is_final: step.prefix_len == text.len(),
        };
        Some((event, (text, steps)))
    }))
}

/// Single-event stream revealing the whole text at once
fn single_final(text: String) -> RevealStream {
    Box::pin(stream::iter([RevealEvent {
        revealed_prefix: text,
        is_final: true,
    }]))
}
