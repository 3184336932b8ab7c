use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

use super::file::FileBackend;
use crate::config::AudioConfig;
use crate::error::{Error, Result};

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since recording started
    pub timestamp_ms: u64,
}

/// What a running recorder reports
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Captured audio, in capture order
    Fragment(AudioFrame),
    /// Device-level failure; the recording is unusable
    Failed(String),
}

/// Configuration for audio backends
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Fragment duration in milliseconds
    pub buffer_duration_ms: u64,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz for speech-to-text
            target_channels: 1,        // Mono
            buffer_duration_ms: 100,   // 100ms fragments
        }
    }
}

impl From<&AudioConfig> for AudioBackendConfig {
    fn from(config: &AudioConfig) -> Self {
        Self {
            target_sample_rate: config.sample_rate,
            target_channels: config.channels,
            buffer_duration_ms: config.buffer_duration_ms,
        }
    }
}

/// Recording device
///
/// Platform implementations:
/// - File: replays a WAV file as if it were spoken into the microphone
/// - Unavailable: platform without any recording capability
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Capability probe: can this platform record at all
    fn is_supported(&self) -> bool;

    /// Acquire a device stream, asking the user for permission if needed
    async fn open_stream(&self) -> Result<Box<dyn InputStream>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// An acquired device stream
///
/// Streams are long-lived and may carry many short recordings, one at a time.
#[async_trait]
pub trait InputStream: Send {
    /// Start a recorder on this stream
    ///
    /// Fragments arrive on the returned channel. The channel closes once the
    /// recorder has stopped and flushed its last fragment.
    async fn start(&mut self) -> Result<mpsc::Receiver<RecorderEvent>>;

    /// Ask the running recorder to stop
    async fn stop(&mut self) -> Result<()>;

    /// Stop every device track and release the stream
    fn close(&mut self);

    /// False once closed or once the device ended the stream
    fn is_open(&self) -> bool;
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// WAV file replayed in real time in place of a microphone
    File(PathBuf),
    /// No recording capability on this platform
    Unavailable,
}

impl AudioSource {
    pub fn from_config(config: &AudioConfig) -> Self {
        match &config.input_file {
            Some(path) => Self::File(path.clone()),
            None => Self::Unavailable,
        }
    }
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend based on configuration
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Box<dyn AudioBackend> {
        match source {
            AudioSource::File(path) => Box::new(FileBackend::new(path, config)),
            AudioSource::Unavailable => Box::new(UnavailableBackend),
        }
    }
}

/// Backend for platforms that cannot record
pub struct UnavailableBackend;

#[async_trait]
impl AudioBackend for UnavailableBackend {
    fn is_supported(&self) -> bool {
        false
    }

    async fn open_stream(&self) -> Result<Box<dyn InputStream>> {
        Err(Error::Unsupported("no recording device configured".to_string()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
