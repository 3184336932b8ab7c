//! Backend operations consumed by the session
//!
//! Speech-to-text, reply generation and text-to-speech all happen behind
//! these four calls. Failures come back as typed errors; nothing here panics.

mod client;
pub mod messages;

use async_trait::async_trait;

use crate::audio::AudioUnit;
use crate::error::Result;

pub use client::HttpGateway;
pub use messages::{AssistantTurn, DEFAULT_INTRO_TEXT, DEFAULT_REPLY_TEXT};

/// Conversation backend
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Start a conversation in `language`, returning the assistant's intro
    async fn initialize(&self, language: &str) -> Result<AssistantTurn>;

    /// Turn a recorded audio unit into text
    async fn transcribe(&self, audio: &AudioUnit) -> Result<String>;

    /// Send the user's text and return the assistant's reply
    async fn send_message(&self, text: &str) -> Result<AssistantTurn>;

    /// Ask for short replies to an assistant message
    async fn suggest_quick_replies(&self, text: &str) -> Result<Vec<String>>;
}
