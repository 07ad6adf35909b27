//! Interaction cycle integration tests
//!
//! Exercises the orchestrator end to end over hardware-free seams, observing
//! everything through the event surface like a presentation layer would.

use std::sync::Arc;
use std::time::Duration;

use mirror_gateway::orchestrator::{
    DEFAULT_FALLBACK_REPLY, DEFAULT_LOCAL_REPLY, InteractionState,
};
use mirror_gateway::speech::SpeechProvider;
use mirror_gateway::{Error, MirrorEvent, RevealEvent};

mod common;

use common::{
    DeafSpeech, RecordedSource, ScriptedInference, ScriptedSpeech, build_orchestrator, call_log,
    drain_events,
};

/// Extract reveal events in publish order
fn reveals(events: &[MirrorEvent]) -> Vec<RevealEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            MirrorEvent::Reveal { event } => Some(event.clone()),
            _ => None,
        })
        .collect()
}

/// Count flourish events
fn flourish_count(events: &[MirrorEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, MirrorEvent::Flourish { .. }))
        .count()
}

/// Extract the visited states in publish order
fn states(events: &[MirrorEvent]) -> Vec<InteractionState> {
    events
        .iter()
        .filter_map(|e| match e {
            MirrorEvent::StateChanged { state } => Some(*state),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn activate_succeeds_only_from_idle() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("what time is it"))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log)),
    );

    assert_eq!(orch.state(), InteractionState::Idle);
    orch.activate().await.unwrap();

    // Back in Idle, a second activation is accepted again
    assert_eq!(orch.state(), InteractionState::Idle);
}

#[tokio::test]
async fn non_trigger_utterance_gets_local_reply_without_vision() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("what time is it"))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log.clone())),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();
    let events = drain_events(&mut rx);

    // Neither the sampler nor the inference client ran
    assert!(log.lock().unwrap().is_empty());

    let reveals = reveals(&events);
    assert_eq!(
        reveals.last().unwrap().revealed_prefix,
        DEFAULT_LOCAL_REPLY
    );
    assert_eq!(flourish_count(&events), 1);

    // The vision states were never entered
    let states = states(&events);
    assert!(!states.contains(&InteractionState::CapturingFrame));
    assert!(!states.contains(&InteractionState::AwaitingInference));
}

#[tokio::test]
async fn trigger_utterance_samples_frame_before_inference() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new(
            "Mirror, mirror on the wall, who is the fairest?",
        ))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("You're lovely today", log.clone())),
    );

    orch.activate().await.unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["frame", "infer"]);
}

#[tokio::test]
async fn reveal_sequence_is_strict_prefix_growth_with_one_final() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("mirror on the wall"))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("You're lovely today", log)),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();
    let reveals = reveals(&drain_events(&mut rx));

    assert!(!reveals.is_empty());
    for pair in reveals.windows(2) {
        assert!(pair[1].revealed_prefix.starts_with(&pair[0].revealed_prefix));
        assert!(pair[1].revealed_prefix.len() > pair[0].revealed_prefix.len());
    }

    let finals: Vec<_> = reveals.iter().filter(|e| e.is_final).collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].revealed_prefix, "You're lovely today");
    assert!(reveals.last().unwrap().is_final);
}

#[tokio::test]
async fn mirror_question_scenario() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("Mirror, mirror on the wall"))),
        Arc::new(RecordedSource::new(640, 480, log.clone())),
        Arc::new(ScriptedInference::ok("You're lovely today", log)),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();
    let events = drain_events(&mut rx);

    assert_eq!(orch.state(), InteractionState::Idle);

    let states = states(&events);
    assert_eq!(
        states,
        vec![
            InteractionState::Listening,
            InteractionState::Evaluating,
            InteractionState::CapturingFrame,
            InteractionState::AwaitingInference,
            InteractionState::Responding,
            InteractionState::Idle,
        ]
    );

    let reveals = reveals(&events);
    assert_eq!(reveals.last().unwrap().revealed_prefix, "You're lovely today");
    assert_eq!(flourish_count(&events), 1);
}

#[tokio::test]
async fn off_topic_scenario() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("what time is it"))),
        Arc::new(RecordedSource::new(640, 480, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log.clone())),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();
    let events = drain_events(&mut rx);

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(
        reveals(&events).last().unwrap().revealed_prefix,
        DEFAULT_LOCAL_REPLY
    );
    assert_eq!(flourish_count(&events), 1);
    assert_eq!(orch.state(), InteractionState::Idle);
}

#[tokio::test]
async fn inference_timeout_degrades_to_fallback_reply() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("mirror on the wall"))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::err(Error::Timeout(5000), log)),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();
    let events = drain_events(&mut rx);

    assert_eq!(
        reveals(&events).last().unwrap().revealed_prefix,
        DEFAULT_FALLBACK_REPLY
    );
    assert_eq!(flourish_count(&events), 1);
    assert_eq!(orch.state(), InteractionState::Idle);
}

#[tokio::test]
async fn unready_source_degrades_to_fallback_reply() {
    let log = call_log();
    // Zero dimensions: the feed is not ready
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("mirror on the wall"))),
        Arc::new(RecordedSource::new(0, 0, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log.clone())),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();
    let events = drain_events(&mut rx);

    // The precondition failed before any frame was read or submitted
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(
        reveals(&events).last().unwrap().revealed_prefix,
        DEFAULT_FALLBACK_REPLY
    );
    assert_eq!(orch.state(), InteractionState::Idle);
}

#[tokio::test]
async fn failed_speech_capture_ends_cycle_silently() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(DeafSpeech)),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log.clone())),
    );
    let mut rx = orch.events().subscribe();

    let err = orch.activate().await.unwrap_err();
    assert!(matches!(err, Error::NoMatch));
    assert_eq!(orch.state(), InteractionState::Idle);

    let events = drain_events(&mut rx);
    assert!(reveals(&events).is_empty());
    assert_eq!(flourish_count(&events), 0);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_capability_ends_cycle_silently() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Unavailable {
            reason: "speech recognition not supported".to_string(),
        },
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log)),
    );
    let mut rx = orch.events().subscribe();

    let err = orch.activate().await.unwrap_err();
    assert!(matches!(err, Error::CapabilityUnavailable(_)));
    assert_eq!(orch.state(), InteractionState::Idle);
    assert_eq!(flourish_count(&drain_events(&mut rx)), 0);
}

#[tokio::test]
async fn cycle_can_repeat_after_completion() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("what time is it"))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log)),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();
    orch.activate().await.unwrap();

    let events = drain_events(&mut rx);
    assert_eq!(flourish_count(&events), 2);
    assert_eq!(orch.state(), InteractionState::Idle);
}

#[tokio::test]
async fn utterance_is_surfaced_to_presentation() {
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("what time is it"))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("unused", log)),
    );
    let mut rx = orch.events().subscribe();

    orch.activate().await.unwrap();

    let recognized: Vec<_> = drain_events(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            MirrorEvent::UtteranceRecognized { utterance } => Some(utterance.text),
            _ => None,
        })
        .collect();
    assert_eq!(recognized, vec!["what time is it".to_string()]);
}

#[tokio::test]
async fn processing_delay_is_a_floor_not_a_hard_sleep() {
    // With the delay configured to zero the cycle completes immediately;
    // nothing in the orchestrator depends on the two-second default.
    let log = call_log();
    let orch = build_orchestrator(
        SpeechProvider::Available(Arc::new(ScriptedSpeech::new("mirror on the wall"))),
        Arc::new(RecordedSource::new(64, 48, log.clone())),
        Arc::new(ScriptedInference::ok("quick", log)),
    );

    let started = std::time::Instant::now();
    orch.activate().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}
