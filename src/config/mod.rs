//! Configuration management for the mirror gateway

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;

use crate::flourish::FlourishIntensity;
use crate::orchestrator::{
    DEFAULT_FALLBACK_REPLY, DEFAULT_LOCAL_REPLY, DEFAULT_TRIGGER_PHRASE, OrchestratorConfig,
};
use crate::vision::FrameFormat;
use crate::{Error, Result};

use file::MirrorConfigFile;

/// Mirror gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Phrase routing an utterance to the vision path
    pub trigger_phrase: String,

    /// Reply for non-trigger utterances
    pub local_reply: String,

    /// Reply substituted for vision-path failures
    pub fallback_reply: String,

    /// Pacing floor between evaluation and the branch target
    pub processing_delay: Duration,

    /// Completion flourish intensity
    pub flourish: FlourishIntensity,

    /// Inference service configuration
    pub inference: InferenceConfig,

    /// Speech recognition configuration
    pub speech: SpeechConfig,

    /// Speech synthesis configuration
    pub synthesis: SynthesisConfig,

    /// Frame sampling configuration
    pub frame: FrameConfig,
}

/// Inference service configuration
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Endpoint URL
    pub endpoint: String,

    /// Request deadline
    pub timeout: Duration,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Transcription endpoint URL
    pub endpoint: String,

    /// API key (from `MIRROR_STT_API_KEY`)
    pub api_key: Option<String>,

    /// Transcription model
    pub model: String,

    /// Longest listen window before giving up
    pub max_listen: Duration,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// TTS endpoint URL
    pub endpoint: String,

    /// API key (from `MIRROR_TTS_API_KEY`)
    pub api_key: Option<String>,

    /// TTS model
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Speed multiplier
    pub speed: f64,
}

/// Frame sampling configuration
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Encoding format
    pub format: FrameFormat,

    /// Downscale bound on the longest edge
    pub max_dimension: Option<u32>,

    /// Still image standing in for a live feed
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
            local_reply: DEFAULT_LOCAL_REPLY.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            processing_delay: Duration::from_secs(2),
            flourish: FlourishIntensity::Global,
            inference: InferenceConfig {
                endpoint: "http://localhost:8000/inference".to_string(),
                timeout: crate::inference::DEFAULT_TIMEOUT,
            },
            speech: SpeechConfig {
                endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
                api_key: None,
                model: "whisper-1".to_string(),
                max_listen: Duration::from_secs(10),
            },
            synthesis: SynthesisConfig {
                endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
                api_key: None,
                model: "tts-1".to_string(),
                voice: "alloy".to_string(),
                speed: 1.0,
            },
            frame: FrameConfig {
                format: FrameFormat::Jpeg,
                max_dimension: Some(1024),
                source_path: None,
            },
        }
    }
}

impl Config {
    /// Load configuration: defaults, then file overlay, then env keys
    ///
    /// With no explicit path the default location
    /// (`~/.config/omni/mirror/config.toml`) is used when present.
    ///
    /// # Errors
    ///
    /// Returns error if an existing config file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                MirrorConfigFile::load(path)?
            }
            None => default_config_path()
                .map(|p| MirrorConfigFile::load(&p))
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_file(file);
        config.apply_env();
        Ok(config)
    }

    /// The orchestrator's slice of the configuration
    #[must_use]
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            trigger_phrase: self.trigger_phrase.clone(),
            local_reply: self.local_reply.clone(),
            fallback_reply: self.fallback_reply.clone(),
            processing_delay: self.processing_delay,
            flourish: self.flourish,
        }
    }

    fn apply_file(&mut self, file: MirrorConfigFile) {
        if let Some(phrase) = file.interaction.trigger_phrase {
            self.trigger_phrase = phrase;
        }
        if let Some(reply) = file.interaction.local_reply {
            self.local_reply = reply;
        }
        if let Some(reply) = file.interaction.fallback_reply {
            self.fallback_reply = reply;
        }
        if let Some(ms) = file.interaction.processing_delay_ms {
            self.processing_delay = Duration::from_millis(ms);
        }
        if let Some(flourish) = file.interaction.flourish {
            self.flourish = flourish;
        }

        if let Some(endpoint) = file.inference.endpoint {
            self.inference.endpoint = endpoint;
        }
        if let Some(ms) = file.inference.timeout_ms {
            self.inference.timeout = Duration::from_millis(ms);
        }

        if let Some(endpoint) = file.speech.endpoint {
            self.speech.endpoint = endpoint;
        }
        if let Some(model) = file.speech.model {
            self.speech.model = model;
        }
        if let Some(ms) = file.speech.max_listen_ms {
            self.speech.max_listen = Duration::from_millis(ms);
        }

        if let Some(endpoint) = file.synthesis.endpoint {
            self.synthesis.endpoint = endpoint;
        }
        if let Some(model) = file.synthesis.model {
            self.synthesis.model = model;
        }
        if let Some(voice) = file.synthesis.voice {
            self.synthesis.voice = voice;
        }
        if let Some(speed) = file.synthesis.speed {
            self.synthesis.speed = speed;
        }

        if let Some(format) = file.frame.format {
            self.frame.format = format;
        }
        if let Some(max) = file.frame.max_dimension {
            self.frame.max_dimension = Some(max);
        }
        if let Some(path) = file.frame.source_path {
            self.frame.source_path = Some(path);
        }
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("MIRROR_STT_API_KEY") {
            self.speech.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("MIRROR_TTS_API_KEY") {
            self.synthesis.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var("MIRROR_INFERENCE_URL") {
            self.inference.endpoint = endpoint;
        }
    }
}

/// Default config file location
fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "omni", "mirror").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_behavior() {
        let config = Config::default();
        assert_eq!(config.trigger_phrase, "mirror on the wall");
        assert_eq!(config.local_reply, "I only answer magic mirror questions!");
        assert_eq!(config.processing_delay, Duration::from_secs(2));
        assert_eq!(config.inference.endpoint, "http://localhost:8000/inference");
        assert_eq!(config.frame.format, FrameFormat::Jpeg);
    }

    #[test]
    fn test_file_overlay_applies() {
        let mut config = Config::default();
        let file: MirrorConfigFile = toml::from_str(
            r#"
            [interaction]
            trigger_phrase = "who is the fairest"
            processing_delay_ms = 0

            [inference]
            endpoint = "http://mirror.local/inference"
            "#,
        )
        .unwrap();

        config.apply_file(file);
        assert_eq!(config.trigger_phrase, "who is the fairest");
        assert!(config.processing_delay.is_zero());
        assert_eq!(config.inference.endpoint, "http://mirror.local/inference");
        // Untouched fields keep their defaults
        assert_eq!(config.synthesis.voice, "alloy");
    }
}
