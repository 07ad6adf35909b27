//! Remote speech transcription

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::capture::{MicCapture, SAMPLE_RATE, UtteranceEndpointer, samples_to_wav};
use super::{Settled, SpeechCapture, Utterance};
use crate::{Error, Result};

/// Poll interval while waiting for the endpointer (100ms of audio at 16kHz)
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Response from the transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes captured audio via a remote endpoint
pub struct Transcriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl Transcriber {
    /// Create a new transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is empty
    pub fn new(endpoint: String, api_key: Option<String>, model: String) -> Result<Self> {
        if endpoint.is_empty() {
            return Err(Error::Config(
                "transcription endpoint required".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Recognizer(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "transcription request failed");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Recognizer(format!(
                "transcription error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

/// Microphone-backed single-shot speech capture
///
/// Each activation records on a dedicated thread (cpal streams are not Send)
/// until the endpointer segments one utterance, then transcribes it and
/// resolves exactly once. An empty transcript resolves as `NoMatch`.
pub struct MicSpeechCapture {
    transcriber: Transcriber,
    max_listen: Duration,
}

impl MicSpeechCapture {
    /// Create a microphone capture bound to a transcriber
    ///
    /// Probes the input device once; callers wrap the error in
    /// [`super::SpeechProvider::Unavailable`] when the probe fails. The
    /// capture thread re-opens the device per activation.
    ///
    /// # Errors
    ///
    /// Returns error if no usable input device exists
    pub fn new(transcriber: Transcriber, max_listen: Duration) -> Result<Self> {
        drop(MicCapture::new()?);
        Ok(Self {
            transcriber,
            max_listen,
        })
    }
}

#[async_trait]
impl SpeechCapture for MicSpeechCapture {
    async fn listen_once(&self) -> Result<Utterance> {
        let max_listen = self.max_listen;
        let (tx, rx) = tokio::sync::oneshot::channel();

        std::thread::spawn(move || {
            let _ = tx.send(record_utterance(max_listen));
        });

        let samples = rx
            .await
            .map_err(|_| Error::Audio("capture thread died".to_string()))??;

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let text = self.transcriber.transcribe(&wav).await?;
        if text.trim().is_empty() {
            return Err(Error::NoMatch);
        }

        Ok(Utterance::now(text))
    }
}

/// Record until one utterance is segmented or the listen window closes
///
/// The settled guard keeps delivery at-most-once: only the first completion
/// event resolves; anything the endpointer reports afterwards is dropped.
fn record_utterance(max_listen: Duration) -> Result<Vec<f32>> {
    let mut capture = MicCapture::new()?;
    capture.start()?;

    let settled = Settled::new();
    let mut endpointer = UtteranceEndpointer::new();
    let started = Instant::now();

    let outcome = loop {
        std::thread::sleep(POLL_INTERVAL);

        let chunk = capture.take_buffer();
        if !chunk.is_empty() && endpointer.process(&chunk) && settled.settle() {
            break Ok(endpointer.take_utterance());
        }

        if started.elapsed() > max_listen && settled.settle() {
            break Err(Error::NoMatch);
        }
    };

    capture.stop();
    outcome
}
