//! Conversation transcript
//!
//! Owns the ordered message log shown to the user and the audio payloads
//! attached to assistant replies.

mod chat;
mod message;

pub use chat::ChatTranscript;
pub use message::{AudioPayload, Message, MessageId, Role, DEFAULT_AUDIO_MIME};
