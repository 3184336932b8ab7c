//! Signals for whatever renders the session
//!
//! The controller never touches a view directly. It publishes what changed and
//! the adapter (HTTP, terminal, tests) decides how to show it.

use tokio::sync::broadcast;

use crate::audio::PlayState;
use crate::session::Affordances;
use crate::transcript::{Message, MessageId};

/// Capacity of the UI event channel
pub const EVENT_CAPACITY: usize = 256;

pub type EventBus = broadcast::Sender<UiEvent>;

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// A message was added to the transcript
    MessageAppended(Message),
    /// The transcript view should show its newest entry
    ScrollToLatest,
    /// The primary control, language selector or review input changed
    AffordancesChanged(Affordances),
    /// The status line changed
    StatusChanged(String),
    /// The visible quick-reply chips changed (empty when hidden)
    QuickRepliesChanged(Vec<String>),
    /// A playback toggle flipped
    PlaybackChanged {
        message_id: MessageId,
        state: PlayState,
    },
}

pub fn event_bus() -> EventBus {
    let (tx, _) = broadcast::channel(EVENT_CAPACITY);
    tx
}
