//! Daemon - the interactive mirror service
//!
//! Assembles the configured components, resolves the speech and synthesis
//! capabilities once at startup, and runs the activation loop. Event
//! rendering here is the stand-in presentation layer; the core only ever
//! publishes on the event bus.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::events::{EventBus, MirrorEvent};
use crate::inference::InferenceClient;
use crate::narrator::{HttpSynthesizer, Narrator, SynthesisProvider};
use crate::orchestrator::Orchestrator;
use crate::speech::{FixedUtterance, MicSpeechCapture, SpeechProvider, Transcriber};
use crate::vision::{FrameSampler, FrameSource, StillImageSource, TestPatternSource};
use crate::{Error, Result};

/// Dimensions of the synthetic frame source used without a configured feed
const PATTERN_SIZE: (u32, u32) = (640, 480);

/// The mirror daemon - wires configuration into a running orchestrator
pub struct MirrorDaemon {
    orchestrator: Arc<Orchestrator>,
}

impl MirrorDaemon {
    /// Create a daemon listening on the microphone
    ///
    /// # Errors
    ///
    /// Returns error if a component fails to initialize
    pub fn new(config: Config) -> Result<Self> {
        let speech = probe_speech(&config);
        Self::with_speech(config, speech)
    }

    /// Create a daemon with an explicit speech capability
    ///
    /// Used by the `ask` subcommand, where the question arrives typed.
    ///
    /// # Errors
    ///
    /// Returns error if a component fails to initialize
    pub fn with_speech(config: Config, speech: SpeechProvider) -> Result<Self> {
        let events = EventBus::default();

        let source: Arc<dyn FrameSource> = match &config.frame.source_path {
            Some(path) => Arc::new(StillImageSource::open(path)?),
            None => {
                tracing::info!("no frame source configured, using test pattern");
                Arc::new(TestPatternSource::new(PATTERN_SIZE.0, PATTERN_SIZE.1))
            }
        };

        let sampler = FrameSampler::new(config.frame.format, config.frame.max_dimension);
        let inference = Arc::new(InferenceClient::new(
            config.inference.endpoint.clone(),
            config.inference.timeout,
        )?);
        let narrator = Narrator::new(probe_synthesis(&config));

        let orchestrator = Arc::new(Orchestrator::new(
            config.orchestrator(),
            speech,
            source,
            sampler,
            inference,
            narrator,
            events,
        ));

        Ok(Self { orchestrator })
    }

    /// The orchestrator driving interaction cycles
    #[must_use]
    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Run until interrupted; each Enter keypress activates one cycle
    ///
    /// # Errors
    ///
    /// Returns error if stdin cannot be read
    pub async fn run(&self) -> Result<()> {
        let _render = spawn_renderer(self.orchestrator.events());

        println!("Press Enter to ask the mirror (ctrl-c to quit)");

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown requested");
                    break;
                }
                line = lines.next_line() => {
                    if line?.is_none() {
                        break;
                    }
                    match self.orchestrator.activate().await {
                        Ok(()) => {}
                        Err(Error::AlreadyActive) => {
                            tracing::warn!("a cycle is already running");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "cycle ended without output");
                        }
                    }
                    println!("\nPress Enter to ask the mirror (ctrl-c to quit)");
                }
            }
        }

        tracing::info!("daemon stopped");
        Ok(())
    }

    /// Drive one cycle with a typed utterance instead of the microphone
    ///
    /// # Errors
    ///
    /// Returns error if the cycle fails before producing output
    pub async fn ask(config: Config, text: &str) -> Result<()> {
        let speech = SpeechProvider::Available(Arc::new(FixedUtterance::new(text)));
        let daemon = Self::with_speech(config, speech)?;

        let _render = spawn_renderer(daemon.orchestrator.events());
        daemon.orchestrator.activate().await?;

        // Let the renderer drain before the process exits
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        Ok(())
    }
}

/// Resolve the speech-recognition capability once
fn probe_speech(config: &Config) -> SpeechProvider {
    let transcriber = match Transcriber::new(
        config.speech.endpoint.clone(),
        config.speech.api_key.clone(),
        config.speech.model.clone(),
    ) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "speech recognition unavailable");
            return SpeechProvider::Unavailable {
                reason: e.to_string(),
            };
        }
    };

    match MicSpeechCapture::new(transcriber, config.speech.max_listen) {
        Ok(capture) => SpeechProvider::Available(Arc::new(capture)),
        Err(e) => {
            tracing::warn!(error = %e, "speech recognition unavailable");
            SpeechProvider::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Resolve the synthesis capability once
fn probe_synthesis(config: &Config) -> SynthesisProvider {
    if cpal::traits::HostTrait::default_output_device(&cpal::default_host()).is_none() {
        tracing::warn!("no output device, narration will reveal all at once");
        return SynthesisProvider::Unavailable {
            reason: "no output device".to_string(),
        };
    }

    match HttpSynthesizer::new(
        config.synthesis.endpoint.clone(),
        config.synthesis.api_key.clone(),
        config.synthesis.model.clone(),
        config.synthesis.voice.clone(),
        config.synthesis.speed,
    ) {
        Ok(synth) => SynthesisProvider::Available(Arc::new(synth)),
        Err(e) => {
            tracing::warn!(error = %e, "synthesis unavailable, narration will reveal all at once");
            SynthesisProvider::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Render events to the terminal (presentation stand-in)
fn spawn_renderer(events: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();

    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                MirrorEvent::StateChanged { state } => {
                    tracing::debug!(%state, "state changed");
                }
                MirrorEvent::UtteranceRecognized { utterance } => {
                    println!("You said: {}", utterance.text);
                }
                MirrorEvent::Reveal { event } => {
                    print!("\rMirror replies: {}", event.revealed_prefix);
                    let _ = std::io::stdout().flush();
                    if event.is_final {
                        println!();
                    }
                }
                MirrorEvent::Flourish { intensity } => {
                    println!("* pixie dust ({intensity}) *");
                }
            }
        }
    })
}
