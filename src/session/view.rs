use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::affordances::Affordances;
use super::machine::SessionState;
use crate::audio::PlayState;
use crate::suggest::SuggestionSource;
use crate::transcript::{Message, MessageId};

/// Read-only snapshot of a session for renderers
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: SessionState,
    pub is_working: bool,
    pub status: String,
    pub language: &'static str,
    pub draft_text: String,
    pub affordances: Affordances,
    pub quick_replies: Vec<String>,
    pub quick_reply_source: Option<SuggestionSource>,
    /// True only in IDLE with at least one suggestion
    pub chips_visible: bool,
    pub messages: Vec<Message>,
    pub playback: BTreeMap<MessageId, PlayState>,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
}
