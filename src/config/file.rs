//! TOML configuration file loading
//!
//! Supports `~/.config/omni/mirror/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on top of
//! defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::flourish::FlourishIntensity;
use crate::vision::FrameFormat;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct MirrorConfigFile {
    /// Interaction tunables
    #[serde(default)]
    pub interaction: InteractionFileConfig,

    /// Inference service configuration
    #[serde(default)]
    pub inference: InferenceFileConfig,

    /// Speech recognition configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisFileConfig,

    /// Frame sampling configuration
    #[serde(default)]
    pub frame: FrameFileConfig,
}

/// Interaction-cycle tunables
#[derive(Debug, Default, Deserialize)]
pub struct InteractionFileConfig {
    /// Trigger phrase routing to the vision path
    pub trigger_phrase: Option<String>,

    /// Reply for non-trigger utterances
    pub local_reply: Option<String>,

    /// Reply substituted when the vision path fails
    pub fallback_reply: Option<String>,

    /// Pacing floor in milliseconds between evaluation and the branch
    pub processing_delay_ms: Option<u64>,

    /// Completion flourish intensity ("local" or "global")
    pub flourish: Option<FlourishIntensity>,
}

/// Inference service configuration
#[derive(Debug, Default, Deserialize)]
pub struct InferenceFileConfig {
    /// Endpoint URL (e.g. "http://localhost:8000/inference")
    pub endpoint: Option<String>,

    /// Request deadline in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Speech recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Transcription endpoint URL
    pub endpoint: Option<String>,

    /// Transcription model (e.g. "whisper-1")
    pub model: Option<String>,

    /// Longest listen window in milliseconds before giving up
    pub max_listen_ms: Option<u64>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisFileConfig {
    /// TTS endpoint URL
    pub endpoint: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub model: Option<String>,

    /// Voice identifier (e.g. "alloy")
    pub voice: Option<String>,

    /// Speed multiplier
    pub speed: Option<f64>,
}

/// Frame sampling configuration
#[derive(Debug, Default, Deserialize)]
pub struct FrameFileConfig {
    /// Encoding format ("jpeg" or "png")
    pub format: Option<FrameFormat>,

    /// Downscale bound on the longest edge
    pub max_dimension: Option<u32>,

    /// Still image standing in for a live feed
    pub source_path: Option<PathBuf>,
}

impl MirrorConfigFile {
    /// Load from a TOML file; a missing file yields the empty overlay
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let parsed = toml::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(parsed)
    }
}
