use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::affordances::Affordances;
use super::machine::{self, Effect, Event, Outcome, PrimaryAction, SessionState};
use super::session::Session;
use super::view::SessionView;
use crate::audio::{
    AudioBackend, AudioCaptureManager, AudioPlaybackController, PlayState, PlaybackDevice,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{event_bus, EventBus, UiEvent};
use crate::gateway::{AssistantTurn, Gateway};
use crate::language::Language;
use crate::suggest::{QuickReplySet, QuickReplySuggester, StalenessToken};
use crate::transcript::{AudioPayload, Message, MessageId, Role};

const INITIALIZE_FAILED: &str = "Initialization failed. Please try again.";
const TRANSCRIBE_FAILED: &str = "Transcription failed.";
const SEND_FAILED: &str = "Something went wrong while sending.";
const EMPTY_DRAFT: &str = "Please enter text before sending.";
const MICROPHONE_UNAVAILABLE: &str = "Microphone unavailable";

/// Result of activating the primary control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Another action was outstanding; nothing happened
    Ignored,
    Completed {
        action: PrimaryAction,
        outcome: Outcome,
        state: SessionState,
    },
}

/// Holds the busy flag for the lifetime of one action
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// How a dispatched action ended, plus a status line that overrides the
/// state's default one
struct Resolution {
    outcome: Outcome,
    status: Option<&'static str>,
}

impl Resolution {
    fn succeeded() -> Self {
        Self {
            outcome: Outcome::Succeeded,
            status: None,
        }
    }

    fn failed() -> Self {
        Self {
            outcome: Outcome::Failed,
            status: None,
        }
    }
}

/// Drives one voice chat session
///
/// At most one primary action runs at a time; activations that arrive while
/// one is outstanding are dropped. Quick-reply computations run in the
/// background and are discarded when the session has moved on by the time
/// they finish.
pub struct SessionController {
    session: Arc<Mutex<Session>>,
    working: AtomicBool,
    gateway: Arc<dyn Gateway>,
    capture: Mutex<AudioCaptureManager>,
    playback: AudioPlaybackController,
    suggester: Arc<QuickReplySuggester>,
    events: EventBus,
    autoplay: bool,
    suggestion_tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(
        config: &Config,
        gateway: Arc<dyn Gateway>,
        audio_backend: Arc<dyn AudioBackend>,
        playback_device: Arc<dyn PlaybackDevice>,
    ) -> Self {
        let language = Language::resolve(&config.session.language);
        if Language::find(&config.session.language).is_none() {
            warn!(
                "Unknown language '{}', using {}",
                config.session.language, language.label
            );
        }

        let mut session = Session::new(language);
        let welcome = config.session.welcome_text.as_deref();
        if let Some(welcome) = welcome.filter(|t| !t.trim().is_empty()) {
            session.append(Role::Assistant, welcome, None);
        }
        info!("Created session {} ({})", session.id(), language.label);

        let events = event_bus();
        let suggester =
            QuickReplySuggester::new(Arc::clone(&gateway), config.quick_replies.network_enabled);

        Self {
            session: Arc::new(Mutex::new(session)),
            working: AtomicBool::new(false),
            capture: Mutex::new(AudioCaptureManager::new(audio_backend, &config.audio)),
            playback: AudioPlaybackController::new(playback_device, events.clone()),
            suggester: Arc::new(suggester),
            gateway,
            events,
            autoplay: config.session.autoplay,
            suggestion_tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn is_working(&self) -> bool {
        self.working.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Activate the primary control
    ///
    /// Runs the action of the current state to completion and applies the
    /// resulting transition. Returns [`Dispatch::Ignored`] if an action is
    /// already outstanding.
    pub async fn activate(&self) -> Dispatch {
        let Some(busy) = BusyGuard::acquire(&self.working) else {
            debug!("Activation ignored, an action is outstanding");
            return Dispatch::Ignored;
        };

        let state = self.state().await;
        let Some(action) = machine::step(state, false, Event::Activate).dispatched() else {
            return Dispatch::Ignored;
        };

        info!("Dispatching {:?} from {:?}", action, state);
        self.publish_affordances(state);
        if let Some(status) = action.working_status() {
            self.set_status(status).await;
        }

        let resolution = match action {
            PrimaryAction::Initialize => self.run_initialize().await,
            PrimaryAction::StartRecording => self.run_start_recording().await,
            PrimaryAction::StopRecording => self.run_stop_recording().await,
            PrimaryAction::Send => self.run_send().await,
        };

        let outcome = resolution.outcome;
        let next = self.complete(action, resolution).await;

        drop(busy);
        self.publish_affordances(next);

        Dispatch::Completed {
            action,
            outcome,
            state: next,
        }
    }

    async fn run_initialize(&self) -> Resolution {
        let language = self.session.lock().await.language();

        match self.gateway.initialize(language.code).await {
            Ok(turn) => {
                self.append_assistant(turn).await;
                Resolution::succeeded()
            }
            Err(e) => {
                error!("Initialization failed: {}", e);
                self.append_text(INITIALIZE_FAILED).await;
                Resolution::failed()
            }
        }
    }

    async fn run_start_recording(&self) -> Resolution {
        let result = self.capture.lock().await.start().await;

        match result {
            Ok(()) => Resolution::succeeded(),
            Err(e) => {
                warn!("Could not start recording: {}", e);
                self.append_text(e.user_message()).await;
                Resolution {
                    outcome: Outcome::Failed,
                    status: Some(MICROPHONE_UNAVAILABLE),
                }
            }
        }
    }

    async fn run_stop_recording(&self) -> Resolution {
        let captured = self.capture.lock().await.stop().await;

        let unit = match captured {
            Ok(unit) => unit,
            Err(e) => {
                warn!("Recording ended without usable audio: {}", e);
                self.append_text(e.user_message()).await;
                return Resolution::failed();
            }
        };

        info!(
            "Transcribing {:.1}s of audio ({} bytes)",
            unit.duration_seconds(),
            unit.data.len()
        );

        match self.gateway.transcribe(&unit).await {
            Ok(text) => {
                self.session.lock().await.set_draft(text);
                Resolution::succeeded()
            }
            Err(e) => {
                error!("Transcription failed: {}", e);
                self.append_text(TRANSCRIBE_FAILED).await;
                Resolution::failed()
            }
        }
    }

    async fn run_send(&self) -> Resolution {
        let draft = self.session.lock().await.draft().trim().to_string();
        if draft.is_empty() {
            self.append_text(EMPTY_DRAFT).await;
            return Resolution::failed();
        }

        match self.gateway.send_message(&draft).await {
            Ok(turn) => {
                self.append(Role::User, draft, None).await;
                self.append_assistant(turn).await;
                self.session.lock().await.clear_draft();
                Resolution::succeeded()
            }
            Err(e) => {
                error!("Send failed: {}", e);
                self.append_text(SEND_FAILED).await;
                Resolution::failed()
            }
        }
    }

    /// Apply the completion transition and run its effects
    async fn complete(&self, action: PrimaryAction, resolution: Resolution) -> SessionState {
        let (step, status_changed, status) = {
            let mut session = self.session.lock().await;
            let step = machine::step(
                session.state(),
                true,
                Event::Completed {
                    action,
                    outcome: resolution.outcome,
                },
            );
            session.set_state(step.next);
            let status = resolution.status.unwrap_or(step.next.ready_status());
            (step, session.set_status(status), status)
        };

        info!("{:?} {:?}, now {:?}", action, resolution.outcome, step.next);
        if status_changed {
            let _ = self.events.send(UiEvent::StatusChanged(status.to_string()));
        }
        self.run_effects(&step.effects, step.next).await;

        step.next
    }

    async fn run_effects(&self, effects: &[Effect], state: SessionState) {
        for effect in effects {
            match effect {
                Effect::RefreshAffordances => self.publish_affordances(state),
                Effect::RecomputeQuickReplies => self.recompute_quick_replies().await,
                Effect::Dispatch(action) => debug!("Nested dispatch of {:?} skipped", action),
            }
        }
    }

    fn publish_affordances(&self, state: SessionState) {
        let affordances = Affordances::derive(state, self.is_working());
        let _ = self.events.send(UiEvent::AffordancesChanged(affordances));
    }

    async fn set_status(&self, status: &str) {
        if self.session.lock().await.set_status(status) {
            let _ = self.events.send(UiEvent::StatusChanged(status.to_string()));
        }
    }

    async fn append_text(&self, content: &str) -> Message {
        self.append(Role::Assistant, content, None).await
    }

    async fn append(
        &self,
        role: Role,
        content: impl Into<String>,
        audio: Option<AudioPayload>,
    ) -> Message {
        let message = self.session.lock().await.append(role, content, audio);
        let _ = self.events.send(UiEvent::MessageAppended(message.clone()));
        let _ = self.events.send(UiEvent::ScrollToLatest);
        message
    }

    /// Append an assistant turn, attaching a playback toggle for its audio
    async fn append_assistant(&self, turn: AssistantTurn) -> Message {
        let message = self.append(Role::Assistant, turn.text, turn.audio).await;

        match self.playback.attach(&message).await {
            Ok(Some(toggle)) if self.autoplay => {
                let state = toggle.activate().await;
                debug!("Autoplay of message #{} left it {:?}", message.id, state);
            }
            Ok(_) => {}
            Err(e) => warn!("Audio of message #{} is not playable: {}", message.id, e),
        }

        message
    }

    /// Supersede any outstanding suggestion request and start a new one
    ///
    /// Outside IDLE the chips are hidden right away and nothing is computed.
    async fn recompute_quick_replies(&self) {
        let (token, state, language) = {
            let mut session = self.session.lock().await;
            let token = session.advance_suggestions();
            (token, session.state(), session.language())
        };

        if state != SessionState::Idle {
            let cleared = self.session.lock().await.set_quick_replies(None);
            if cleared {
                let _ = self.events.send(UiEvent::QuickRepliesChanged(Vec::new()));
            }
            return;
        }

        let session = Arc::clone(&self.session);
        let suggester = Arc::clone(&self.suggester);
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            let result = suggester.compute(&token, language).await;
            publish_if_current(&session, &events, &token, result).await;
        });

        let mut tasks = self.suggestion_tasks.lock().await;
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    /// Wait until every outstanding suggestion computation has resolved
    pub async fn wait_for_suggestions(&self) {
        let tasks: Vec<JoinHandle<()>> = self.suggestion_tasks.lock().await.drain(..).collect();
        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    error!("Quick-reply task panicked: {}", e);
                }
            }
        }
    }

    /// Edit the draft; only possible while reviewing
    pub async fn set_draft(&self, text: impl Into<String>) -> bool {
        let mut session = self.session.lock().await;
        if session.state() != SessionState::Review {
            debug!("Draft edit ignored in {:?}", session.state());
            return false;
        }
        session.set_draft(text);
        true
    }

    /// Pick the session language; only possible before initialization
    pub async fn set_language(&self, name: &str) -> Result<bool> {
        let language = Language::find(name)
            .ok_or_else(|| Error::Config(format!("unsupported language '{}'", name)))?;

        if self.is_working() {
            return Ok(false);
        }

        let applied = self.session.lock().await.set_language(language);
        if applied {
            info!("Session language set to {}", language.label);
        }
        Ok(applied)
    }

    /// Select a visible quick-reply chip by position
    ///
    /// The chip's label becomes the draft and the session moves to REVIEW.
    /// Returns the selected label, or `None` if no such chip is visible.
    pub async fn select_quick_reply(&self, index: usize) -> Option<String> {
        let (step, label) = {
            let mut session = self.session.lock().await;
            let step = machine::step(session.state(), self.is_working(), Event::QuickReplyPicked);
            if step.is_ignored() {
                debug!("Quick reply ignored in {:?}", session.state());
                return None;
            }
            let label = session.visible_suggestions().get(index).cloned()?;

            session.set_draft(label.clone());
            session.set_state(step.next);
            session.set_status(step.next.ready_status());
            (step, label)
        };

        info!("Quick reply '{}' selected", label);
        let _ = self.events.send(UiEvent::StatusChanged(step.next.ready_status().to_string()));
        self.run_effects(&step.effects, step.next).await;

        Some(label)
    }

    pub async fn toggle_playback(&self, message_id: MessageId) -> Result<PlayState> {
        self.playback.toggle(message_id).await
    }

    pub async fn snapshot(&self) -> SessionView {
        let is_working = self.is_working();
        let playback = self.playback.states().await;
        let session = self.session.lock().await;
        let quick_replies = session.visible_suggestions().to_vec();
        let elapsed = chrono::Utc::now() - session.started_at();

        SessionView {
            session_id: session.id(),
            state: session.state(),
            is_working,
            status: session.status().to_string(),
            language: session.language().code,
            draft_text: session.draft().to_string(),
            affordances: Affordances::derive(session.state(), is_working),
            chips_visible: session.state() == SessionState::Idle && !quick_replies.is_empty(),
            quick_reply_source: session.quick_replies().map(|set| set.source),
            quick_replies,
            messages: session.transcript().messages().to_vec(),
            playback,
            started_at: session.started_at(),
            duration_secs: elapsed.num_milliseconds() as f64 / 1000.0,
        }
    }

    /// Release the microphone, silence playback and drop pending work
    pub async fn shutdown(&self) {
        let id = self.session.lock().await.id();
        info!("Shutting down session {}", id);

        for task in self.suggestion_tasks.lock().await.drain(..) {
            task.abort();
        }
        self.capture.lock().await.release();
        self.playback.shutdown().await;
    }
}

/// Show a computed suggestion set unless the session has moved on
async fn publish_if_current(
    session: &Mutex<Session>,
    events: &EventBus,
    token: &StalenessToken,
    result: Option<QuickReplySet>,
) {
    let mut session = session.lock().await;

    if session.state() != SessionState::Idle || session.suggestion_token() != *token {
        debug!("Discarding stale quick replies (generation {})", token.generation);
        return;
    }

    if session.set_quick_replies(result) {
        let labels = session.visible_suggestions().to_vec();
        let _ = events.send(UiEvent::QuickRepliesChanged(labels));
    }
}
