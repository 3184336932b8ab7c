use serde::Serialize;

use super::machine::SessionState;

/// Everything the view needs to draw the controls for a state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub state: SessionState,
    pub action_label: &'static str,
    pub action_icon: &'static str,
    /// False while an action is outstanding
    pub action_enabled: bool,
    /// The session language is fixed once initialized
    pub language_editable: bool,
    pub review_input_visible: bool,
}

impl Affordances {
    pub fn derive(state: SessionState, is_working: bool) -> Self {
        let action = state.primary_action();

        Self {
            state,
            action_label: action.label(),
            action_icon: action.icon(),
            action_enabled: !is_working,
            language_editable: state == SessionState::Init && !is_working,
            review_input_visible: state == SessionState::Review,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_input_only_in_review() {
        assert!(Affordances::derive(SessionState::Review, false).review_input_visible);
        assert!(!Affordances::derive(SessionState::Recording, false).review_input_visible);
        assert!(!Affordances::derive(SessionState::Idle, false).review_input_visible);
    }

    #[test]
    fn test_language_locked_after_init() {
        assert!(Affordances::derive(SessionState::Init, false).language_editable);
        assert!(!Affordances::derive(SessionState::Init, true).language_editable);
        assert!(!Affordances::derive(SessionState::Idle, false).language_editable);
    }

    #[test]
    fn test_labels_follow_state() {
        let idle = Affordances::derive(SessionState::Idle, true);
        assert_eq!(idle.action_label, "Start Recording");
        assert_eq!(idle.action_icon, "🎤");
        assert!(!idle.action_enabled);
    }
}
