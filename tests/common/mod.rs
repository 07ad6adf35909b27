//! Shared test doubles for the orchestration seams
//!
//! Everything here runs hardware-free: speech resolves from scripted text,
//! frames come from an in-memory source, inference and synthesis are stubs
//! that record how they were driven.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mirror_gateway::inference::Inference;
use mirror_gateway::narrator::{Narrator, SpeechSynthesis, SpokenAudio, SynthesisProvider};
use mirror_gateway::orchestrator::{Orchestrator, OrchestratorConfig};
use mirror_gateway::speech::{SpeechCapture, SpeechProvider, Utterance};
use mirror_gateway::vision::{FrameFormat, FrameSampler, FrameSource, ImagePayload, RawFrame};
use mirror_gateway::{Error, EventBus, MirrorEvent, Result};

/// Shared log of seam invocations, in call order
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// Create an empty call log
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Speech capture resolving with scripted text
pub struct ScriptedSpeech {
    text: String,
}

impl ScriptedSpeech {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl SpeechCapture for ScriptedSpeech {
    async fn listen_once(&self) -> Result<Utterance> {
        Ok(Utterance::now(self.text.clone()))
    }
}

/// Speech capture that always fails with `NoMatch`
pub struct DeafSpeech;

#[async_trait]
impl SpeechCapture for DeafSpeech {
    async fn listen_once(&self) -> Result<Utterance> {
        Err(Error::NoMatch)
    }
}

/// In-memory frame source recording each read
pub struct RecordedSource {
    width: u32,
    height: u32,
    log: CallLog,
}

impl RecordedSource {
    pub fn new(width: u32, height: u32, log: CallLog) -> Self {
        Self { width, height, log }
    }
}

#[async_trait]
impl FrameSource for RecordedSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn current_frame(&self) -> Result<RawFrame> {
        self.log.lock().unwrap().push("frame");
        Ok(RawFrame {
            width: self.width,
            height: self.height,
            pixels: vec![0u8; (self.width * self.height * 3) as usize],
        })
    }
}

/// Inference stub with a scripted outcome, recording each submission
pub struct ScriptedInference {
    outcome: Mutex<Option<Result<String>>>,
    log: CallLog,
}

impl ScriptedInference {
    pub fn ok(text: &str, log: CallLog) -> Self {
        Self {
            outcome: Mutex::new(Some(Ok(text.to_string()))),
            log,
        }
    }

    pub fn err(error: Error, log: CallLog) -> Self {
        Self {
            outcome: Mutex::new(Some(Err(error))),
            log,
        }
    }
}

#[async_trait]
impl Inference for ScriptedInference {
    async fn submit(&self, _frame: &ImagePayload) -> Result<String> {
        self.log.lock().unwrap().push("infer");
        self.outcome
            .lock()
            .unwrap()
            .take()
            .expect("inference submitted more than once")
    }
}

/// Synthesis producing zero-length audio so reveals pace at zero delay
pub struct InstantSynth;

#[async_trait]
impl SpeechSynthesis for InstantSynth {
    async fn synthesize(&self, _text: &str) -> Result<SpokenAudio> {
        Ok(SpokenAudio {
            samples: Vec::new(),
            sample_rate: 24000,
        })
    }

    async fn play(&self, _audio: &SpokenAudio) -> Result<()> {
        Ok(())
    }
}

/// Build an orchestrator over the given seams with a zero processing delay
pub fn build_orchestrator(
    speech: SpeechProvider,
    source: Arc<dyn FrameSource>,
    inference: Arc<dyn Inference>,
) -> Arc<Orchestrator> {
    let config = OrchestratorConfig {
        processing_delay: std::time::Duration::ZERO,
        ..OrchestratorConfig::default()
    };

    Arc::new(Orchestrator::new(
        config,
        speech,
        source,
        FrameSampler::new(FrameFormat::Jpeg, None),
        inference,
        Narrator::new(SynthesisProvider::Available(Arc::new(InstantSynth))),
        EventBus::default(),
    ))
}

/// Drain every event already published on the receiver
pub fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<MirrorEvent>,
) -> Vec<MirrorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
