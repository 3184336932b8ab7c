use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::transcript::AudioPayload;

/// Shown when `initialize` succeeds without an intro text
pub const DEFAULT_INTRO_TEXT: &str = "Initialized. You can start recording.";

/// Shown when `send-message` succeeds without a reply text
pub const DEFAULT_REPLY_TEXT: &str = "No reply returned.";

/// Assistant text plus optional spoken rendition
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantTurn {
    pub text: String,
    pub audio: Option<AudioPayload>,
}

impl AssistantTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: AudioPayload) -> Self {
        self.audio = Some(audio);
        self
    }

    fn from_parts(
        text: Option<String>,
        fallback: &str,
        audio: Option<String>,
        mime: Option<String>,
    ) -> Self {
        let text = text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        // A broken audio payload must not cost the user the reply text
        let audio = audio.filter(|a| !a.trim().is_empty()).and_then(|encoded| {
            match AudioPayload::from_base64(&encoded, mime.as_deref()) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    warn!("Dropping assistant audio: {}", e);
                    None
                }
            }
        });

        Self { text, audio }
    }
}

/// Response of `POST /initialize`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InitializeResponse {
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub intro_audio: Option<String>,
    #[serde(default)]
    pub intro_audio_mime: Option<String>,
}

impl InitializeResponse {
    pub fn into_turn(self) -> AssistantTurn {
        AssistantTurn::from_parts(
            self.intro,
            DEFAULT_INTRO_TEXT,
            self.intro_audio,
            self.intro_audio_mime,
        )
    }
}

/// Response of `POST /upload-audio`
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub transcription: String,
}

/// Body of `POST /send-message` and `POST /quick-replies`
#[derive(Debug, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Response of `POST /send-message`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub reply_audio: Option<String>,
    #[serde(default)]
    pub reply_audio_mime: Option<String>,
}

impl SendMessageResponse {
    pub fn into_turn(self) -> AssistantTurn {
        AssistantTurn::from_parts(
            self.reply,
            DEFAULT_REPLY_TEXT,
            self.reply_audio,
            self.reply_audio_mime,
        )
    }
}

/// Response of `POST /quick-replies`
///
/// Kept as raw JSON so that a wrongly-typed field degrades to "no
/// suggestions" instead of failing the whole response.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QuickReplyResponse {
    #[serde(default)]
    pub quick_replies: Option<serde_json::Value>,
}

impl QuickReplyResponse {
    /// Trimmed, non-empty string entries in backend order
    pub fn into_suggestions(self) -> Vec<String> {
        match self.quick_replies {
            Some(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_reply_response_filters_entries() {
        let response: QuickReplyResponse =
            serde_json::from_str(r#"{"quick_replies": [" Ja ", 3, "", "Nein", null]}"#).unwrap();
        assert_eq!(response.into_suggestions(), vec!["Ja", "Nein"]);
    }

    #[test]
    fn test_quick_reply_response_wrong_type_is_empty() {
        let response: QuickReplyResponse =
            serde_json::from_str(r#"{"quick_replies": "Ja"}"#).unwrap();
        assert!(response.into_suggestions().is_empty());

        let response: QuickReplyResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_suggestions().is_empty());
    }

    #[test]
    fn test_initialize_response_defaults() {
        let turn = InitializeResponse::default().into_turn();
        assert_eq!(turn.text, DEFAULT_INTRO_TEXT);
        assert!(turn.audio.is_none());
    }

    #[test]
    fn test_reply_text_is_kept_verbatim() {
        let response = SendMessageResponse {
            reply: Some("  Gerne!\n".to_string()),
            ..Default::default()
        };
        assert_eq!(response.into_turn().text, "  Gerne!\n");

        let response = InitializeResponse {
            intro: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(response.into_turn().text, DEFAULT_INTRO_TEXT);
    }

    #[test]
    fn test_send_response_drops_broken_audio() {
        let response = SendMessageResponse {
            reply: Some("Danke".to_string()),
            reply_audio: Some("***not base64***".to_string()),
            reply_audio_mime: None,
        };
        let turn = response.into_turn();
        assert_eq!(turn.text, "Danke");
        assert!(turn.audio.is_none());
    }

    #[test]
    fn test_send_response_decodes_audio_with_default_mime() {
        let response = SendMessageResponse {
            reply: Some("Danke".to_string()),
            reply_audio: Some("AAEC".to_string()),
            reply_audio_mime: None,
        };
        let audio = response.into_turn().audio.unwrap();
        assert_eq!(audio.data, vec![0, 1, 2]);
        assert_eq!(audio.mime_type, "audio/mpeg");
    }
}
