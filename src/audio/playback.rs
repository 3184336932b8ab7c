use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventBus, UiEvent};
use crate::transcript::{AudioPayload, Message, MessageId};

/// Visual state of a playback toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Paused,
    Playing,
}

impl PlayState {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Paused => "🔊",
            Self::Playing => "🔇",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Paused => "Play audio response",
            Self::Playing => "Stop audio response",
        }
    }
}

/// Signals emitted by the underlying player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    Play,
    Pause,
    Ended,
}

/// A decodable audio resource bound to one message
#[async_trait]
pub trait AudioHandle: Send + Sync {
    /// Start playing from the current position
    ///
    /// May be rejected, e.g. by an autoplay policy.
    async fn play(&self) -> Result<()>;

    fn pause(&self);

    /// Move the position back to the start
    fn rewind(&self);

    fn is_paused(&self) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<PlaybackSignal>;
}

/// Output device that turns payloads into playable handles
pub trait PlaybackDevice: Send + Sync {
    fn load(&self, payload: &AudioPayload) -> Result<Arc<dyn AudioHandle>>;
}

/// Play/pause control for one assistant message
///
/// The visual state follows the player's own signals, so playback that ends
/// or is paused elsewhere is reflected without a click.
pub struct PlaybackToggle {
    message_id: MessageId,
    handle: Arc<dyn AudioHandle>,
    state: Arc<watch::Sender<PlayState>>,
    events: EventBus,
    listener: JoinHandle<()>,
}

fn apply_state(
    state: &watch::Sender<PlayState>,
    events: &EventBus,
    message_id: MessageId,
    next: PlayState,
) {
    let changed = state.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });

    if changed {
        debug!("Playback #{} -> {:?}", message_id, next);
        let _ = events.send(UiEvent::PlaybackChanged {
            message_id,
            state: next,
        });
    }
}

impl PlaybackToggle {
    pub fn new(message_id: MessageId, handle: Arc<dyn AudioHandle>, events: EventBus) -> Self {
        let initial = if handle.is_paused() {
            PlayState::Paused
        } else {
            PlayState::Playing
        };
        let (state, _) = watch::channel(initial);
        let state = Arc::new(state);

        let mut signals = handle.subscribe();
        let listener = {
            let state = Arc::clone(&state);
            let events = events.clone();
            let handle = Arc::clone(&handle);
            tokio::spawn(async move {
                loop {
                    let next = match signals.recv().await {
                        Ok(PlaybackSignal::Play) => PlayState::Playing,
                        Ok(PlaybackSignal::Pause | PlaybackSignal::Ended) => PlayState::Paused,
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            if handle.is_paused() {
                                PlayState::Paused
                            } else {
                                PlayState::Playing
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };
                    apply_state(&state, &events, message_id, next);
                }
            })
        };

        Self {
            message_id,
            handle,
            state,
            events,
            listener,
        }
    }

    /// Play when paused; otherwise stop and rewind
    ///
    /// A rejected play leaves the toggle paused and is not an error.
    pub async fn activate(&self) -> PlayState {
        if self.handle.is_paused() {
            match self.handle.play().await {
                Ok(()) => {
                    // Playback may already have ended by now
                    let next = if self.handle.is_paused() {
                        PlayState::Paused
                    } else {
                        PlayState::Playing
                    };
                    self.set(next);
                }
                Err(e) => {
                    debug!("Playback #{} rejected: {}", self.message_id, e);
                    self.set(PlayState::Paused);
                }
            }
        } else {
            self.handle.pause();
            self.handle.rewind();
            self.set(PlayState::Paused);
        }

        self.state()
    }

    fn set(&self, next: PlayState) {
        apply_state(&self.state, &self.events, self.message_id, next);
    }

    pub fn state(&self) -> PlayState {
        *self.state.borrow()
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Pause, rewind and stop following the player
    pub fn shutdown(&self) {
        self.listener.abort();
        if !self.handle.is_paused() {
            self.handle.pause();
        }
        self.handle.rewind();
        self.set(PlayState::Paused);
    }
}

impl Drop for PlaybackToggle {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Independent playback toggles, one per audio-bearing message
///
/// Toggles do not exclude each other; several messages may play at once.
pub struct AudioPlaybackController {
    device: Arc<dyn PlaybackDevice>,
    toggles: RwLock<BTreeMap<MessageId, Arc<PlaybackToggle>>>,
    events: EventBus,
}

impl AudioPlaybackController {
    pub fn new(device: Arc<dyn PlaybackDevice>, events: EventBus) -> Self {
        Self {
            device,
            toggles: RwLock::new(BTreeMap::new()),
            events,
        }
    }

    /// Create the toggle for a freshly rendered message, if it carries audio
    pub async fn attach(&self, message: &Message) -> Result<Option<Arc<PlaybackToggle>>> {
        let Some(payload) = &message.audio else {
            return Ok(None);
        };

        let handle = self.device.load(payload)?;
        let toggle = Arc::new(PlaybackToggle::new(message.id, handle, self.events.clone()));

        self.toggles.write().await.insert(message.id, Arc::clone(&toggle));
        debug!("Playback toggle attached to message #{}", message.id);

        Ok(Some(toggle))
    }

    /// Activate the toggle of a message
    pub async fn toggle(&self, message_id: MessageId) -> Result<PlayState> {
        let toggle = self
            .toggles
            .read()
            .await
            .get(&message_id)
            .cloned()
            .ok_or_else(|| Error::Playback(format!("message {} has no audio", message_id)))?;

        Ok(toggle.activate().await)
    }

    pub async fn states(&self) -> BTreeMap<MessageId, PlayState> {
        self.toggles
            .read()
            .await
            .iter()
            .map(|(id, toggle)| (*id, toggle.state()))
            .collect()
    }

    /// Silence and drop every toggle
    pub async fn shutdown(&self) {
        let mut toggles = self.toggles.write().await;
        for toggle in toggles.values() {
            toggle.shutdown();
        }
        if !toggles.is_empty() {
            info!("Stopped {} playback toggles", toggles.len());
        }
        toggles.clear();
    }
}

/// Bytes per second assumed when estimating clip length (128 kbit/s)
const ESTIMATED_BYTES_PER_SEC: u64 = 16_000;

/// Player without an audio device
///
/// Reports play/pause/ended like a real player, ending each clip after its
/// estimated duration. Used by the headless binary.
pub struct SimulatedPlayback;

impl PlaybackDevice for SimulatedPlayback {
    fn load(&self, payload: &AudioPayload) -> Result<Arc<dyn AudioHandle>> {
        if payload.data.is_empty() {
            return Err(Error::Playback("empty audio payload".to_string()));
        }

        let millis = (payload.data.len() as u64 * 1000 / ESTIMATED_BYTES_PER_SEC).max(1);
        let (signals, _) = broadcast::channel(16);

        Ok(Arc::new(SimulatedHandle {
            duration: Duration::from_millis(millis),
            paused: Arc::new(AtomicBool::new(true)),
            signals,
            timer: Mutex::new(None),
        }))
    }
}

struct SimulatedHandle {
    duration: Duration,
    paused: Arc<AtomicBool>,
    signals: broadcast::Sender<PlaybackSignal>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedHandle {
    fn cancel_timer(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(task) = timer.take() {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl AudioHandle for SimulatedHandle {
    async fn play(&self) -> Result<()> {
        if !self.paused.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Playing audio ({:.1}s)", self.duration.as_secs_f64());
        let _ = self.signals.send(PlaybackSignal::Play);

        let paused = Arc::clone(&self.paused);
        let signals = self.signals.clone();
        let duration = self.duration;
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            paused.store(true, Ordering::SeqCst);
            let _ = signals.send(PlaybackSignal::Ended);
        });

        match self.timer.lock() {
            Ok(mut timer) => {
                if let Some(previous) = timer.replace(task) {
                    previous.abort();
                }
            }
            Err(_) => warn!("Playback timer lock poisoned"),
        }

        Ok(())
    }

    fn pause(&self) {
        self.cancel_timer();
        if !self.paused.swap(true, Ordering::SeqCst) {
            let _ = self.signals.send(PlaybackSignal::Pause);
        }
    }

    fn rewind(&self) {
        // Every play starts from the beginning of the clip
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackSignal> {
        self.signals.subscribe()
    }
}
