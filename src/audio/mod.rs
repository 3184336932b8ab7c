//! Audio capture and playback
//!
//! Capture goes through an [`AudioBackend`] that hands out a long-lived
//! device stream; [`AudioCaptureManager`] runs one recording at a time on it
//! and assembles the fragments into an [`AudioUnit`]. Playback is a set of
//! independent per-message toggles driven by [`AudioPlaybackController`].

pub mod backend;
pub mod capture;
pub mod file;
pub mod playback;
pub mod unit;

pub use backend::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource, InputStream,
    RecorderEvent, UnavailableBackend,
};
pub use capture::AudioCaptureManager;
pub use file::{AudioFile, FileBackend};
pub use playback::{
    AudioHandle, AudioPlaybackController, PlayState, PlaybackDevice, PlaybackSignal, PlaybackToggle,
    SimulatedPlayback,
};
pub use unit::{AudioUnit, RECORDING_FILE_NAME, RECORDING_MIME};
