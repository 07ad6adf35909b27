//! Remote speech synthesis

use async_trait::async_trait;

use super::playback::{SpeakerPlayback, decode_mp3};
use super::{SpeechSynthesis, SpokenAudio};
use crate::{Error, Result};

/// Synthesizes speech via a remote TTS endpoint and plays it locally
pub struct HttpSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    voice: String,
    speed: f64,
}

impl HttpSynthesizer {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is empty
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        voice: String,
        speed: f64,
    ) -> Result<Self> {
        if endpoint.is_empty() {
            return Err(Error::Config("synthesis endpoint required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            voice,
            speed,
        })
    }
}

#[async_trait]
impl SpeechSynthesis for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SpokenAudio> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("TTS error {status}: {body}")));
        }

        let mp3 = response.bytes().await?;
        let (samples, sample_rate) = decode_mp3(&mp3)?;

        tracing::debug!(
            text_len = text.len(),
            samples = samples.len(),
            sample_rate,
            "speech synthesized"
        );

        Ok(SpokenAudio {
            samples,
            sample_rate,
        })
    }

    async fn play(&self, audio: &SpokenAudio) -> Result<()> {
        let playback = SpeakerPlayback::new(audio.sample_rate)?;
        let samples = audio.samples.clone();

        // Playback blocks on the output stream; keep it off the async runtime
        tokio::task::spawn_blocking(move || playback.play_blocking(samples))
            .await
            .map_err(|e| Error::Audio(e.to_string()))?
    }
}
