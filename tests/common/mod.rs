// Test doubles for the session: a scripted backend, a scripted microphone and
// a player whose autoplay can be refused.

#![allow(dead_code)]

use async_trait::async_trait;
use loqa_voice_chat::audio::{
    AudioBackend, AudioFrame, AudioHandle, InputStream, PlaybackDevice, PlaybackSignal,
    RecorderEvent,
};
use loqa_voice_chat::config::Config;
use loqa_voice_chat::error::{Error, Result};
use loqa_voice_chat::gateway::{AssistantTurn, Gateway};
use loqa_voice_chat::transcript::AudioPayload;
use loqa_voice_chat::{AudioUnit, SessionController};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Semaphore};

// ============================================================================
// Gateway
// ============================================================================

type SuggestFn = Box<dyn Fn(&str) -> Result<Vec<String>> + Send + Sync>;

/// Backend with queued answers; unscripted calls succeed with defaults
pub struct FakeGateway {
    initialize: Mutex<VecDeque<Result<AssistantTurn>>>,
    transcripts: Mutex<VecDeque<Result<String>>>,
    replies: Mutex<VecDeque<Result<AssistantTurn>>>,
    suggest: Mutex<SuggestFn>,
    initialize_gate: Mutex<Option<Arc<Semaphore>>>,
    suggest_gate: Mutex<Option<Arc<Semaphore>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            initialize: Mutex::new(VecDeque::new()),
            transcripts: Mutex::new(VecDeque::new()),
            replies: Mutex::new(VecDeque::new()),
            suggest: Mutex::new(Box::new(|_| Ok(Vec::new()))),
            initialize_gate: Mutex::new(None),
            suggest_gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push_initialize(&self, result: Result<AssistantTurn>) {
        self.initialize.lock().unwrap().push_back(result);
    }

    pub fn push_transcript(&self, result: Result<String>) {
        self.transcripts.lock().unwrap().push_back(result);
    }

    pub fn push_reply(&self, result: Result<AssistantTurn>) {
        self.replies.lock().unwrap().push_back(result);
    }

    pub fn suggest_with(&self, f: impl Fn(&str) -> Result<Vec<String>> + Send + Sync + 'static) {
        *self.suggest.lock().unwrap() = Box::new(f);
    }

    /// Hold `initialize` calls until permits are added to the returned gate
    pub fn gate_initialize(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.initialize_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold quick-reply calls until permits are added to the returned gate
    pub fn gate_suggestions(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.suggest_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
    let gate = gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        gate.acquire().await.expect("gate closed").forget();
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn initialize(&self, language: &str) -> Result<AssistantTurn> {
        self.record(format!("initialize:{}", language));
        pass(&self.initialize_gate).await;
        let scripted = self.initialize.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(AssistantTurn::text("Hallo")))
    }

    async fn transcribe(&self, audio: &AudioUnit) -> Result<String> {
        self.record(format!("transcribe:{}:{}", audio.mime_type, audio.file_name));
        let scripted = self.transcripts.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok("Guten Tag".to_string()))
    }

    async fn send_message(&self, text: &str) -> Result<AssistantTurn> {
        self.record(format!("send:{}", text));
        let scripted = self.replies.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(AssistantTurn::text("Danke.")))
    }

    async fn suggest_quick_replies(&self, text: &str) -> Result<Vec<String>> {
        self.record(format!("suggest:{}", text));
        pass(&self.suggest_gate).await;
        let suggest = self.suggest.lock().unwrap();
        (*suggest)(text)
    }
}

// ============================================================================
// Microphone
// ============================================================================

/// What the next recording on a fake stream produces
#[derive(Debug, Clone)]
pub enum Take {
    Fragments(Vec<AudioFrame>),
    /// Device error after the given fragments
    Fail(Vec<AudioFrame>, String),
    /// The recorder never closes its channel
    Hang,
}

pub fn frames(count: usize, len: usize) -> Vec<AudioFrame> {
    (0..count)
        .map(|i| AudioFrame {
            samples: vec![i as i16 + 1; len],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: i as u64 * 100,
        })
        .collect()
}

#[derive(Default)]
pub struct BackendStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub recordings: AtomicUsize,
}

pub struct FakeBackend {
    supported: bool,
    deny: bool,
    takes: Arc<Mutex<VecDeque<Take>>>,
    pub stats: Arc<BackendStats>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Self::build(true, false)
    }

    pub fn denying() -> Arc<Self> {
        Self::build(true, true)
    }

    pub fn unsupported() -> Arc<Self> {
        Self::build(false, false)
    }

    fn build(supported: bool, deny: bool) -> Arc<Self> {
        Arc::new(Self {
            supported,
            deny,
            takes: Arc::new(Mutex::new(VecDeque::new())),
            stats: Arc::new(BackendStats::default()),
        })
    }

    pub fn push_take(&self, take: Take) {
        self.takes.lock().unwrap().push_back(take);
    }

    pub fn opened(&self) -> usize {
        self.stats.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.stats.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioBackend for FakeBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn open_stream(&self) -> Result<Box<dyn InputStream>> {
        if self.deny {
            return Err(Error::PermissionDenied("user declined".to_string()));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            takes: Arc::clone(&self.takes),
            stats: Arc::clone(&self.stats),
            open: true,
            sender: None,
            leaked: Vec::new(),
        }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct FakeStream {
    takes: Arc<Mutex<VecDeque<Take>>>,
    stats: Arc<BackendStats>,
    open: bool,
    sender: Option<mpsc::Sender<RecorderEvent>>,
    leaked: Vec<mpsc::Sender<RecorderEvent>>,
}

#[async_trait]
impl InputStream for FakeStream {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecorderEvent>> {
        if self.sender.is_some() {
            return Err(Error::AlreadyRecording);
        }
        self.stats.recordings.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(256);
        let take = self
            .takes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Take::Fragments(Vec::new()));

        match take {
            Take::Fragments(fragments) => {
                for frame in fragments {
                    tx.try_send(RecorderEvent::Fragment(frame)).expect("fragment buffer");
                }
                self.sender = Some(tx);
            }
            Take::Fail(fragments, reason) => {
                for frame in fragments {
                    tx.try_send(RecorderEvent::Fragment(frame)).expect("fragment buffer");
                }
                tx.try_send(RecorderEvent::Failed(reason)).expect("fragment buffer");
                self.sender = Some(tx);
            }
            Take::Hang => {
                self.leaked.push(tx.clone());
                self.sender = Some(tx);
            }
        }

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.sender.take().map(|_| ()).ok_or(Error::NotRecording)
    }

    fn close(&mut self) {
        if self.open {
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
        self.open = false;
        self.sender = None;
        self.leaked.clear();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

// ============================================================================
// Playback
// ============================================================================

pub struct FakeHandle {
    paused: AtomicBool,
    reject: Arc<AtomicBool>,
    pub rewinds: AtomicUsize,
    signals: broadcast::Sender<PlaybackSignal>,
}

impl FakeHandle {
    /// The clip played to its end
    pub fn finish(&self) {
        self.paused.store(true, Ordering::SeqCst);
        let _ = self.signals.send(PlaybackSignal::Ended);
    }

    pub fn is_playing(&self) -> bool {
        !self.paused.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioHandle for FakeHandle {
    async fn play(&self) -> Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::Playback("autoplay blocked".to_string()));
        }
        self.paused.store(false, Ordering::SeqCst);
        let _ = self.signals.send(PlaybackSignal::Play);
        Ok(())
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        let _ = self.signals.send(PlaybackSignal::Pause);
    }

    fn rewind(&self) {
        self.rewinds.fetch_add(1, Ordering::SeqCst);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackSignal> {
        self.signals.subscribe()
    }
}

#[derive(Default)]
pub struct FakePlayback {
    pub reject: Arc<AtomicBool>,
    handles: Mutex<Vec<Arc<FakeHandle>>>,
}

impl FakePlayback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A player that refuses to start until allowed
    pub fn rejecting() -> Arc<Self> {
        let playback = Self::default();
        playback.reject.store(true, Ordering::SeqCst);
        Arc::new(playback)
    }

    pub fn handle(&self, index: usize) -> Arc<FakeHandle> {
        Arc::clone(&self.handles.lock().unwrap()[index])
    }

    pub fn loaded(&self) -> usize {
        self.handles.lock().unwrap().len()
    }
}

impl PlaybackDevice for FakePlayback {
    fn load(&self, _payload: &AudioPayload) -> Result<Arc<dyn AudioHandle>> {
        let (signals, _) = broadcast::channel(16);
        let handle = Arc::new(FakeHandle {
            paused: AtomicBool::new(true),
            reject: Arc::clone(&self.reject),
            rewinds: AtomicUsize::new(0),
            signals,
        });
        self.handles.lock().unwrap().push(Arc::clone(&handle));
        Ok(handle)
    }
}

// ============================================================================
// Session wiring
// ============================================================================

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.session.autoplay = false;
    config.audio.stop_timeout_ms = 200;
    config
}

pub fn controller_with(
    config: &Config,
    gateway: Arc<FakeGateway>,
    backend: Arc<FakeBackend>,
    playback: Arc<FakePlayback>,
) -> Arc<SessionController> {
    Arc::new(SessionController::new(config, gateway, backend, playback))
}

pub fn controller(gateway: Arc<FakeGateway>, backend: Arc<FakeBackend>) -> Arc<SessionController> {
    controller_with(&test_config(), gateway, backend, FakePlayback::new())
}

pub fn audio(bytes: &[u8]) -> AudioPayload {
    AudioPayload::new(bytes.to_vec(), "audio/mpeg")
}

/// Wait until an action is outstanding
pub async fn until_working(controller: &SessionController) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !controller.is_working() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("controller never became busy");
}

/// Let spawned listeners catch up
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
