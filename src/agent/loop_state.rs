//! Dialogue state machine
//!
//! The orchestrator never branches on ad-hoc flags; every change of state goes
//! through [`DialogueState::next`].

use serde::{Deserialize, Serialize};

/// State of one analysis dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DialogueState {
    /// Agents are still taking turns
    Running,
    /// The analyst emitted the terminal marker
    TerminatedNormally,
    /// The turn budget ran out first
    TerminatedByLimit,
    /// A turn could not be produced
    Failed(String),
}

/// Event fed to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Checked before each turn starts
    BudgetCheck { turn_count: usize, max_turns: usize },
    /// A message was appended to the conversation
    Appended { terminal: bool },
    /// The turn executor returned an error
    ExecutorFailed(String),
}

impl DialogueState {
    /// Apply one event; terminal states absorb everything
    pub fn next(self, transition: Transition) -> Self {
        match (self, transition) {
            (DialogueState::Running, Transition::BudgetCheck { turn_count, max_turns })
                if turn_count >= max_turns =>
            {
                DialogueState::TerminatedByLimit
            }
            (DialogueState::Running, Transition::Appended { terminal: true }) => {
                DialogueState::TerminatedNormally
            }
            (DialogueState::Running, Transition::ExecutorFailed(reason)) => {
                DialogueState::Failed(reason)
            }
            (state, _) => state,
        }
    }

    /// Check if the loop should continue
    pub fn is_running(&self) -> bool {
        matches!(self, DialogueState::Running)
    }

    /// Whether the dialogue produced a usable transcript
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            DialogueState::TerminatedNormally | DialogueState::TerminatedByLimit
        )
    }
}

impl std::fmt::Display for DialogueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogueState::Running => write!(f, "running"),
            DialogueState::TerminatedNormally => write!(f, "terminated normally"),
            DialogueState::TerminatedByLimit => write!(f, "terminated by turn limit"),
            DialogueState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_check() {
        let state = DialogueState::Running;
        let state = state.next(Transition::BudgetCheck {
            turn_count: 1,
            max_turns: 2,
        });
        assert_eq!(state, DialogueState::Running);

        let state = state.next(Transition::BudgetCheck {
            turn_count: 2,
            max_turns: 2,
        });
        assert_eq!(state, DialogueState::TerminatedByLimit);
    }

    #[test]
    fn test_terminal_message() {
        let state = DialogueState::Running
            .next(Transition::Appended { terminal: false })
            .next(Transition::Appended { terminal: true });
        assert_eq!(state, DialogueState::TerminatedNormally);
        assert!(state.is_success());
    }

    #[test]
    fn test_terminal_states_absorb() {
        let failed = DialogueState::Running.next(Transition::ExecutorFailed("down".into()));
        assert_eq!(failed, DialogueState::Failed("down".into()));
        assert!(!failed.is_success());

        let still_failed = failed
            .next(Transition::Appended { terminal: true })
            .next(Transition::BudgetCheck {
                turn_count: 9,
                max_turns: 1,
            });
        assert_eq!(still_failed, DialogueState::Failed("down".into()));

        let done = DialogueState::TerminatedNormally.next(Transition::ExecutorFailed("x".into()));
        assert_eq!(done, DialogueState::TerminatedNormally);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(DialogueState::Failed("timeout".into())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");

        let json = serde_json::to_value(DialogueState::TerminatedByLimit).unwrap();
        assert_eq!(json["status"], "terminated_by_limit");
    }
}
