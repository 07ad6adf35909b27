//! Mirror Gateway - Voice and vision interaction orchestrator
//!
//! This library provides the core of an interactive "magic mirror":
//! - Single-shot speech capture and trigger-phrase evaluation
//! - On-demand frame sampling and remote inference
//! - Speech-paced incremental response reveal
//! - A broadcast event surface the presentation layer subscribes to
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Presentation                         │
//! │   video feed  │  text panels  │  flourish effects   │
//! └────────────────────┬────────────────────────────────┘
//!                      │ events
//! ┌────────────────────▼────────────────────────────────┐
//! │              Interaction Orchestrator                │
//! │   Listening │ Evaluating │ Capturing │ Responding   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   Speech (STT)  │  Vision  │  Inference  │  TTS     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod daemon;
pub mod error;
pub mod events;
pub mod flourish;
pub mod inference;
pub mod narrator;
pub mod orchestrator;
pub mod speech;
pub mod trigger;
pub mod vision;

pub use config::Config;
pub use daemon::MirrorDaemon;
pub use error::{Error, Result};
pub use events::{EventBus, MirrorEvent};
pub use flourish::{FlourishIntensity, FlourishTrigger};
pub use inference::{Inference, InferenceClient};
pub use narrator::{
    Narrator, RevealEvent, RevealStream, SpeechSynthesis, SpokenAudio, SynthesisProvider,
};
pub use orchestrator::{
    InteractionState, Orchestrator, OrchestratorConfig, ResponsePayload, ResponseSource,
};
pub use speech::{FixedUtterance, SpeechCapture, SpeechProvider, Utterance};
pub use trigger::TriggerMatcher;
pub use vision::{
    FrameFormat, FrameSampler, FrameSource, ImagePayload, RawFrame, StillImageSource,
    TestPatternSource,
};
