use std::io::Cursor;

use super::backend::AudioFrame;
use crate::error::{Error, Result};

/// MIME type of an assembled recording
pub const RECORDING_MIME: &str = "audio/wav";

/// File name used when uploading a recording
pub const RECORDING_FILE_NAME: &str = "recording.wav";

/// One recording, encoded and ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUnit {
    /// Encoded audio bytes
    pub data: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Total samples across all fragments (all channels)
    pub sample_count: usize,
}

impl AudioUnit {
    /// Encode fragments, in capture order, into a single WAV file
    ///
    /// All fragments must share the format of the first one.
    pub fn from_fragments(fragments: &[AudioFrame]) -> Result<Self> {
        let first = fragments.first().ok_or(Error::NoAudioCaptured)?;
        let (sample_rate, channels) = (first.sample_rate, first.channels);

        if let Some(odd) = fragments
            .iter()
            .find(|f| f.sample_rate != sample_rate || f.channels != channels)
        {
            return Err(Error::RecordingFailed(format!(
                "fragment format changed mid-recording ({}Hz/{}ch -> {}Hz/{}ch)",
                sample_rate, channels, odd.sample_rate, odd.channels
            )));
        }

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut sample_count = 0;
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for fragment in fragments {
                for &sample in &fragment.samples {
                    writer.write_sample(sample)?;
                }
                sample_count += fragment.samples.len();
            }
            writer.finalize()?;
        }

        Ok(Self {
            data: cursor.into_inner(),
            mime_type: RECORDING_MIME.to_string(),
            file_name: RECORDING_FILE_NAME.to_string(),
            sample_rate,
            channels,
            sample_count,
        })
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.sample_count as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}
