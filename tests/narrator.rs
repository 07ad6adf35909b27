//! Narration pacing integration tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;

use mirror_gateway::narrator::{
    Narrator, SpeechSynthesis, SpokenAudio, SynthesisProvider,
};
use mirror_gateway::orchestrator::ResponsePayload;
use mirror_gateway::Result;

/// Synthesis returning audio of a fixed duration
struct TimedSynth {
    duration: Duration,
}

#[async_trait]
impl SpeechSynthesis for TimedSynth {
    async fn synthesize(&self, _text: &str) -> Result<SpokenAudio> {
        let sample_rate = 24000u32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = (self.duration.as_secs_f64() * f64::from(sample_rate)) as usize;
        Ok(SpokenAudio {
            samples: vec![0.0; samples],
            sample_rate,
        })
    }

    async fn play(&self, _audio: &SpokenAudio) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn one_reveal_per_word() {
    let narrator = Narrator::new(SynthesisProvider::Available(Arc::new(TimedSynth {
        duration: Duration::ZERO,
    })));

    let events: Vec<_> = narrator
        .narrate(&ResponsePayload::remote("You must be the fairest of them all"))
        .await
        .collect()
        .await;

    assert_eq!(events.len(), 8);
    assert_eq!(
        events.last().unwrap().revealed_prefix,
        "You must be the fairest of them all"
    );
}

#[tokio::test]
async fn pacing_spreads_over_the_audio_duration() {
    let narrator = Narrator::new(SynthesisProvider::Available(Arc::new(TimedSynth {
        duration: Duration::from_millis(200),
    })));

    let started = Instant::now();
    let events: Vec<_> = narrator
        .narrate(&ResponsePayload::remote("one two three four"))
        .await
        .collect()
        .await;
    let elapsed = started.elapsed();

    assert_eq!(events.len(), 4);
    // The reveal takes roughly as long as the spoken audio
    assert!(elapsed >= Duration::from_millis(150), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn narration_is_finite_and_terminates_once() {
    let narrator = Narrator::new(SynthesisProvider::Available(Arc::new(TimedSynth {
        duration: Duration::ZERO,
    })));

    let events: Vec<_> = narrator
        .narrate(&ResponsePayload::local("I only answer magic mirror questions!"))
        .await
        .collect()
        .await;

    let finals = events.iter().filter(|e| e.is_final).count();
    assert_eq!(finals, 1);
    assert!(events.last().unwrap().is_final);
}

#[tokio::test]
async fn unavailable_synthesis_reveals_everything_at_once() {
    let narrator = Narrator::new(SynthesisProvider::Unavailable {
        reason: "no output device".to_string(),
    });

    let events: Vec<_> = narrator
        .narrate(&ResponsePayload::local("Not bad, but even magic has its limits!"))
        .await
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(events[0].is_final);
    assert_eq!(
        events[0].revealed_prefix,
        "Not bad, but even magic has its limits!"
    );
}

#[tokio::test]
async fn empty_response_still_terminates() {
    let narrator = Narrator::new(SynthesisProvider::Available(Arc::new(TimedSynth {
        duration: Duration::ZERO,
    })));

    let events: Vec<_> = narrator
        .narrate(&ResponsePayload::local(""))
        .await
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(events[0].is_final);
    assert_eq!(events[0].revealed_prefix, "");
}
