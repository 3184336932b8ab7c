use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::machine::SessionState;
use crate::language::Language;
use crate::suggest::{QuickReplySet, StalenessToken};
use crate::transcript::{AudioPayload, ChatTranscript, Message, Role};

/// Mutable data of one voice chat session
///
/// Only the controller holds this, behind a mutex that is never kept across
/// a backend call.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: SessionState,
    language: &'static Language,
    draft_text: String,
    status: String,
    transcript: ChatTranscript,
    /// Chips currently shown; only ever `Some` in IDLE
    quick_replies: Option<QuickReplySet>,
    suggestion_generation: u64,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(language: &'static Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Init,
            language,
            draft_text: String::new(),
            status: SessionState::Init.ready_status().to_string(),
            transcript: ChatTranscript::new(),
            quick_replies: None,
            suggestion_generation: 0,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        self.state = state;
        if state != SessionState::Idle {
            self.quick_replies = None;
        }
    }

    pub fn language(&self) -> &'static Language {
        self.language
    }

    /// Change the language; refused once the session has left INIT
    pub fn set_language(&mut self, language: &'static Language) -> bool {
        if self.state != SessionState::Init {
            return false;
        }
        self.language = language;
        true
    }

    pub fn draft(&self) -> &str {
        &self.draft_text
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    pub fn clear_draft(&mut self) {
        self.draft_text.clear();
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns true when the status actually changed
    pub fn set_status(&mut self, status: &str) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status.to_string();
        true
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        audio: Option<AudioPayload>,
    ) -> Message {
        self.transcript.append(role, content, audio).clone()
    }

    /// Token of the newest quick-reply request
    pub fn suggestion_token(&self) -> StalenessToken {
        StalenessToken {
            generation: self.suggestion_generation,
            assistant_text: self.transcript.last_assistant_text().to_string(),
        }
    }

    /// Start a new quick-reply request, superseding any outstanding one
    pub fn advance_suggestions(&mut self) -> StalenessToken {
        self.suggestion_generation += 1;
        self.suggestion_token()
    }

    pub fn quick_replies(&self) -> Option<&QuickReplySet> {
        self.quick_replies.as_ref()
    }

    /// Replace the visible chips; returns true when the labels changed
    pub fn set_quick_replies(&mut self, set: Option<QuickReplySet>) -> bool {
        let incoming = set.as_ref().map(|s| s.suggestions.as_slice()).unwrap_or_default();
        let changed = self.visible_suggestions() != incoming;
        self.quick_replies = set;
        changed
    }

    pub fn visible_suggestions(&self) -> &[String] {
        self.quick_replies
            .as_ref()
            .map(|set| set.suggestions.as_slice())
            .unwrap_or_default()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
