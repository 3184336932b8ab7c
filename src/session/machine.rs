use serde::Serialize;

/// Interaction state of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Init,
    Idle,
    Recording,
    Review,
}

impl SessionState {
    /// What the primary control does in this state
    pub fn primary_action(self) -> PrimaryAction {
        match self {
            Self::Init => PrimaryAction::Initialize,
            Self::Idle => PrimaryAction::StartRecording,
            Self::Recording => PrimaryAction::StopRecording,
            Self::Review => PrimaryAction::Send,
        }
    }

    /// Status line once the state has been entered
    pub fn ready_status(self) -> &'static str {
        match self {
            Self::Init => "Ready to initialize",
            Self::Idle => "Ready to record",
            Self::Recording => "Recording...",
            Self::Review => "Ready to edit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    Initialize,
    StartRecording,
    StopRecording,
    Send,
}

impl PrimaryAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Initialize => "Initialize",
            Self::StartRecording => "Start Recording",
            Self::StopRecording => "Stop",
            Self::Send => "Send",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Initialize => "⚙",
            Self::StartRecording => "🎤",
            Self::StopRecording => "■",
            Self::Send => "➤",
        }
    }

    /// Status line while the action is outstanding
    pub fn working_status(self) -> Option<&'static str> {
        match self {
            Self::Initialize => Some("Initializing..."),
            Self::StartRecording => None,
            Self::StopRecording => Some("Transcribing..."),
            Self::Send => Some("Sending..."),
        }
    }

    /// State entered when the action resolves
    pub fn next_state(self, outcome: Outcome) -> SessionState {
        use Outcome::{Failed, Succeeded};

        match (self, outcome) {
            (Self::Initialize, Succeeded) => SessionState::Idle,
            (Self::Initialize, Failed) => SessionState::Init,
            (Self::StartRecording, Succeeded) => SessionState::Recording,
            (Self::StartRecording, Failed) => SessionState::Idle,
            (Self::StopRecording, Succeeded) => SessionState::Review,
            (Self::StopRecording, Failed) => SessionState::Idle,
            (Self::Send, Succeeded) => SessionState::Idle,
            (Self::Send, Failed) => SessionState::Review,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The primary control was activated
    Activate,
    /// The dispatched action finished
    Completed {
        action: PrimaryAction,
        outcome: Outcome,
    },
    /// A quick-reply chip was chosen
    QuickReplyPicked,
}

/// Work the controller must carry out after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Run the action against the capture manager or the backend
    Dispatch(PrimaryAction),
    /// Re-derive control label/icon, language selector and review input
    RefreshAffordances,
    /// Ask the suggester for a new quick-reply set (clears unless idle)
    RecomputeQuickReplies,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub next: SessionState,
    pub effects: Vec<Effect>,
}

impl Step {
    fn ignore(state: SessionState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }

    fn enter(next: SessionState) -> Self {
        Self {
            next,
            effects: vec![Effect::RefreshAffordances, Effect::RecomputeQuickReplies],
        }
    }

    /// Nothing changes and nothing runs
    pub fn is_ignored(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn dispatched(&self) -> Option<PrimaryAction> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Dispatch(action) => Some(*action),
            _ => None,
        })
    }
}

/// Pure transition function of the session
///
/// Activations while an action is outstanding are ignored. Completions only
/// apply to the action the current state dispatches. Every transition, even
/// back into the same state, refreshes affordances and suggestions.
pub fn step(state: SessionState, is_working: bool, event: Event) -> Step {
    match event {
        Event::Activate if is_working => Step::ignore(state),
        Event::Activate => Step {
            next: state,
            effects: vec![Effect::Dispatch(state.primary_action())],
        },
        Event::Completed { action, outcome } if action == state.primary_action() => {
            Step::enter(action.next_state(outcome))
        }
        Event::Completed { .. } => Step::ignore(state),
        Event::QuickReplyPicked if state == SessionState::Idle && !is_working => {
            Step::enter(SessionState::Review)
        }
        Event::QuickReplyPicked => Step::ignore(state),
    }
}
