use anyhow::Context;
use async_trait::async_trait;
use hound::WavReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame, InputStream, RecorderEvent};
use crate::error::{Error, Result};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Samples per fragment of `duration_ms`, never zero
    fn fragment_len(&self, duration_ms: u64) -> usize {
        let per_second = self.sample_rate as u64 * self.channels as u64;
        ((per_second * duration_ms / 1000) as usize).max(self.channels.max(1) as usize)
    }
}

/// Backend replaying a WAV file in real time
pub struct FileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
}

impl FileBackend {
    pub fn new(path: PathBuf, config: AudioBackendConfig) -> Self {
        Self { path, config }
    }
}

#[async_trait]
impl AudioBackend for FileBackend {
    fn is_supported(&self) -> bool {
        self.path.exists()
    }

    async fn open_stream(&self) -> Result<Box<dyn InputStream>> {
        if !self.is_supported() {
            return Err(Error::Unsupported(format!("{} does not exist", self.path.display())));
        }

        let audio = AudioFile::open(&self.path)
            .map_err(|e| Error::RecordingFailed(format!("{:#}", e)))?;

        Ok(Box::new(FileStream {
            audio: Arc::new(audio),
            buffer_duration_ms: self.config.buffer_duration_ms.max(1),
            open: true,
            recorder: None,
        }))
    }

    fn name(&self) -> &str {
        "file"
    }
}

struct FileRecorder {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct FileStream {
    audio: Arc<AudioFile>,
    buffer_duration_ms: u64,
    open: bool,
    recorder: Option<FileRecorder>,
}

#[async_trait]
impl InputStream for FileStream {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecorderEvent>> {
        if !self.open {
            return Err(Error::RecordingFailed("stream is closed".to_string()));
        }
        if self.recorder.is_some() {
            return Err(Error::AlreadyRecording);
        }

        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let audio = Arc::clone(&self.audio);
        let period_ms = self.buffer_duration_ms;

        let task = tokio::spawn(async move {
            debug!("File recorder started: {}", audio.path);

            let fragment_len = audio.fragment_len(period_ms);
            let mut fragments = audio.samples.chunks(fragment_len).enumerate();
            let mut ticker = tokio::time::interval(Duration::from_millis(period_ms));

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        // Once the file is exhausted the recorder idles until stopped
                        if let Some((index, samples)) = fragments.next() {
                            let frame = AudioFrame {
                                samples: samples.to_vec(),
                                sample_rate: audio.sample_rate,
                                channels: audio.channels,
                                timestamp_ms: index as u64 * period_ms,
                            };
                            if tx.send(RecorderEvent::Fragment(frame)).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }

            debug!("File recorder stopped");
        });

        self.recorder = Some(FileRecorder { stop_tx, task });
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let recorder = self.recorder.take().ok_or(Error::NotRecording)?;
        // The recorder may already have exited on its own
        let _ = recorder.stop_tx.send(());
        Ok(())
    }

    fn close(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.task.abort();
        }
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        self.close();
    }
}
