use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioFrame, InputStream, RecorderEvent};
use super::unit::AudioUnit;
use crate::config::AudioConfig;
use crate::error::{Error, Result};

/// The one recording that may exist at a time
struct ActiveRecording {
    events: mpsc::Receiver<RecorderEvent>,
    started_at: Instant,
}

/// Owns the microphone stream and the single active recording
///
/// The stream is long-lived and reused across recordings; recordings are
/// short-lived. The stream is closed on [`AudioCaptureManager::release`] and
/// when the manager is dropped, so the device never stays open by accident.
pub struct AudioCaptureManager {
    backend: Arc<dyn AudioBackend>,
    stream: Option<Box<dyn InputStream>>,
    recording: Option<ActiveRecording>,
    stop_timeout: Duration,
    release_after_recording: bool,
}

impl AudioCaptureManager {
    pub fn new(backend: Arc<dyn AudioBackend>, config: &AudioConfig) -> Self {
        Self {
            backend,
            stream: None,
            recording: None,
            stop_timeout: config.stop_timeout(),
            release_after_recording: config.release_after_recording,
        }
    }

    /// Acquire the device stream unless one is already held
    pub async fn ensure_permission(&mut self) -> Result<()> {
        if !self.backend.is_supported() {
            return Err(Error::Unsupported(format!(
                "backend '{}' cannot record",
                self.backend.name()
            )));
        }

        if self.stream.as_ref().is_some_and(|s| s.is_open()) {
            return Ok(());
        }

        info!("Acquiring audio stream from {} backend", self.backend.name());
        let stream = self.backend.open_stream().await?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Begin a recording on the (possibly newly acquired) stream
    pub async fn start(&mut self) -> Result<()> {
        if self.recording.is_some() {
            warn!("Recording already started");
            return Err(Error::AlreadyRecording);
        }

        self.ensure_permission().await?;

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::RecordingFailed("no audio stream".to_string()))?;

        let events = stream.start().await?;
        self.recording = Some(ActiveRecording {
            events,
            started_at: Instant::now(),
        });

        info!("Recording started");
        Ok(())
    }

    /// End the recording and assemble its fragments into one audio unit
    ///
    /// Fails with [`Error::NoAudioCaptured`] when nothing was captured and
    /// [`Error::RecordingFailed`] on a device failure. Either way the
    /// recording is gone afterwards.
    pub async fn stop(&mut self) -> Result<AudioUnit> {
        let recording = self.recording.take().ok_or(Error::NotRecording)?;
        let elapsed = recording.started_at.elapsed();

        let result = self.finish(recording).await;

        match &result {
            Ok(unit) => info!(
                "Recording stopped after {:.1}s ({:.1}s of audio, {} bytes)",
                elapsed.as_secs_f64(),
                unit.duration_seconds(),
                unit.data.len()
            ),
            Err(e) => warn!("Recording discarded after {:.1}s: {}", elapsed.as_secs_f64(), e),
        }

        if self.release_after_recording {
            self.release();
        }

        result
    }

    async fn finish(&mut self, mut recording: ActiveRecording) -> Result<AudioUnit> {
        if let Some(stream) = self.stream.as_mut() {
            stream.stop().await?;
        }

        let mut fragments: Vec<AudioFrame> = Vec::new();
        let drain = async {
            while let Some(event) = recording.events.recv().await {
                match event {
                    RecorderEvent::Fragment(frame) if frame.samples.is_empty() => {}
                    RecorderEvent::Fragment(frame) => fragments.push(frame),
                    RecorderEvent::Failed(reason) => return Err(Error::RecordingFailed(reason)),
                }
            }
            Ok(())
        };

        match tokio::time::timeout(self.stop_timeout, drain).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(Error::RecordingFailed(format!(
                    "recorder did not finish within {}ms",
                    self.stop_timeout.as_millis()
                )))
            }
        }

        debug!("Collected {} fragments", fragments.len());

        if fragments.is_empty() {
            return Err(Error::NoAudioCaptured);
        }

        AudioUnit::from_fragments(&fragments)
    }

    /// Stop all device tracks and drop the stream (and any recording)
    pub fn release(&mut self) {
        if self.recording.take().is_some() {
            warn!("Discarding active recording on release");
        }

        if let Some(mut stream) = self.stream.take() {
            stream.close();
            info!("Audio stream released");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_open())
    }
}

impl Drop for AudioCaptureManager {
    fn drop(&mut self) {
        self.release();
    }
}
