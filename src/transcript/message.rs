use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};

/// MIME type assumed for assistant audio when the backend does not name one
pub const DEFAULT_AUDIO_MIME: &str = "audio/mpeg";

/// Position of a message in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Decoded audio attached to an assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioPayload {
    /// Raw encoded audio (e.g. MP3 bytes)
    #[serde(rename = "bytes", serialize_with = "serialize_len")]
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl AudioPayload {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Decode a base64-carried payload; an empty MIME type means `audio/mpeg`
    pub fn from_base64(encoded: &str, mime_type: Option<&str>) -> Result<Self> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::MalformedResponse(format!("invalid audio payload: {}", e)))?;

        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_AUDIO_MIME);

        Ok(Self::new(data, mime_type))
    }
}

fn serialize_len<S: Serializer>(
    data: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(data.len() as u64)
}

/// A single transcript entry, immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioPayload>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}
