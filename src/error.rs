//! Error types for the voice chat session

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a voice chat session
#[derive(Debug, Error)]
pub enum Error {
    /// The platform offers no recording capability
    #[error("audio recording is not supported: {0}")]
    Unsupported(String),

    /// The user declined microphone access
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// A recording was started while another one is active
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// A recording was stopped while none is active
    #[error("no recording in progress")]
    NotRecording,

    /// The recorder produced zero fragments
    #[error("no audio captured")]
    NoAudioCaptured,

    /// The device signalled a failure during recording
    #[error("recording failed: {0}")]
    RecordingFailed(String),

    /// Network or backend failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend responded but the payload failed validation
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Playback device error
    #[error("playback error: {0}")]
    Playback(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Message shown in the transcript when a capture operation fails
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => "Audio recording is not supported on this device.",
            Self::PermissionDenied(_) => "Microphone permission was denied.",
            Self::AlreadyRecording => "A recording is already in progress.",
            Self::NoAudioCaptured => "No audio captured.",
            Self::RecordingFailed(_) | Self::NotRecording => "Recording failed.",
            Self::Transport(_) | Self::MalformedResponse(_) => "Something went wrong.",
            Self::Playback(_) => "Audio playback failed.",
            Self::Config(_) => "The session is misconfigured.",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        Self::RecordingFailed(err.to_string())
    }
}
