use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub session: SessionSettings,
    pub audio: AudioConfig,
    pub quick_replies: QuickReplyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "loqa-voice-chat".to_string(),
            http: HttpConfig::default(),
        }
    }
}

/// Local control API listener
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

/// Conversation backend (speech-to-text, LLM, text-to-speech)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Language code sent with `initialize` (fixed once the session is up)
    pub language: String,
    /// Optional greeting appended before the session is initialized
    pub welcome_text: Option<String>,
    /// Start playing assistant audio as soon as it is rendered
    pub autoplay: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            language: "de".to_string(),
            welcome_text: None,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Fragment size produced by recorders
    pub buffer_duration_ms: u64,
    /// How long `stop()` waits for the recorder to flush its last fragments
    pub stop_timeout_ms: u64,
    /// Close the microphone stream after every recording instead of reusing it
    pub release_after_recording: bool,
    /// WAV file replayed by the file backend
    pub input_file: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            buffer_duration_ms: 100,
            stop_timeout_ms: 2000,
            release_after_recording: false,
            input_file: None,
        }
    }
}

impl AudioConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuickReplyConfig {
    /// Ask the backend for suggestions before falling back to heuristics
    pub network_enabled: bool,
}

impl Default for QuickReplyConfig {
    fn default() -> Self {
        Self {
            network_enabled: true,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LOQA_CHAT").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }
}
