use chrono::Utc;
use tracing::debug;

use super::message::{AudioPayload, Message, MessageId, Role};

/// Append-only, insertion-ordered log of the conversation
///
/// Messages are never mutated or removed. The text of the most recent
/// assistant message is tracked separately; quick-reply computations use it
/// to detect that they have been superseded.
#[derive(Debug, Default)]
pub struct ChatTranscript {
    messages: Vec<Message>,
    last_assistant_text: String,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return it
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        audio: Option<AudioPayload>,
    ) -> &Message {
        let content = content.into();
        let id = MessageId(self.messages.len() as u64);

        if role == Role::Assistant {
            self.last_assistant_text = content.clone();
        }

        debug!("Transcript append #{} ({:?}, {} chars)", id, role, content.chars().count());

        self.messages.push(Message {
            id,
            role,
            content,
            audio,
            created_at: Utc::now(),
        });

        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Text of the most recent assistant message ("" before the first one)
    pub fn last_assistant_text(&self) -> &str {
        &self.last_assistant_text
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
