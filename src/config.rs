//! Application configuration
//!
//! Loaded from `<config dir>/parley/config.toml`. Every field has a default,
//! so a missing file (or a partial one) still produces a usable config.

use crate::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default chat endpoint, matching the reference server's `/ask` route
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/ask";

const APP_DIR: &str = "parley";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// URL of the chat endpoint receiving `{"message": ...}`
    pub endpoint: String,

    /// Request timeout in seconds (0 disables the timeout)
    pub request_timeout_secs: u64,

    /// Directory for persisted conversations
    pub data_dir: PathBuf,

    /// Speech configuration
    pub voice: VoiceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
            data_dir: default_data_dir(),
            voice: VoiceConfig::default(),
        }
    }
}

/// Speech synthesis and recognition settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Text-to-speech model; speech output is unavailable when unset
    pub tts: Option<TtsModelConfig>,

    /// Whisper model; speech input is unavailable when unset
    pub stt: Option<SttModelConfig>,

    /// Voice preference substrings, matched against voice names
    pub preferences: Vec<String>,

    /// Language prefix accepted when no preferred name matches
    pub preferred_language: String,

    /// Silero VAD speech probability threshold
    pub vad_threshold: f32,

    /// Trailing silence that ends an utterance, in milliseconds
    pub silence_ms: u64,

    /// Hard cap on a single utterance, in seconds
    pub max_utterance_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts: None,
            stt: None,
            preferences: vec!["Google".to_string(), "Microsoft".to_string()],
            preferred_language: "en".to_string(),
            vad_threshold: 0.5,
            silence_ms: 800,
            max_utterance_secs: 15,
        }
    }
}

/// VITS model files for sherpa-rs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TtsModelConfig {
    /// Display name of the voice
    #[serde(default = "default_voice_name")]
    pub name: String,

    /// BCP 47 language tag of the voice
    #[serde(default = "default_voice_language")]
    pub language: String,

    pub model_path: PathBuf,
    pub tokens_path: PathBuf,

    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub speaker_id: i32,
}

/// Whisper model settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SttModelConfig {
    pub model_path: PathBuf,

    #[serde(default = "default_threads")]
    pub n_threads: i32,
}

fn default_voice_name() -> String {
    "Piper".to_string()
}

fn default_voice_language() -> String {
    "en-US".to_string()
}

fn default_threads() -> i32 {
    4
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Location of the user config file, if the platform has a config dir
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl AppConfig {
    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ParleyError::ConfigError(e.to_string()))
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ParleyError::ConfigError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let config = Self::from_toml(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the user config, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring invalid config: {}", e);
                Self::default()
            }
        }
    }

    /// Set the chat endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Request timeout, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ParleyError::ConfigError(format!(
                "Endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }

        if !(0.0..=1.0).contains(&self.voice.vad_threshold) {
            return Err(ParleyError::ConfigError(format!(
                "VAD threshold must be between 0 and 1: {}",
                self.voice.vad_threshold
            )));
        }

        if self.voice.max_utterance_secs == 0 {
            return Err(ParleyError::ConfigError(
                "Maximum utterance length must be positive".into(),
            ));
        }

        Ok(())
    }
}
