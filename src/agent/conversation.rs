//! Conversation history management
//!
//! An append-only message log plus the dialogue state. Once terminated it is
//! frozen into a [`Transcript`].

use serde::{Deserialize, Serialize};

use crate::agent::loop_state::{DialogueState, Transition};
use crate::core::{AgentRole, Message, Result, TradeHelperError};

/// Returned in place of a report when no analyst message carries the marker
pub const NO_REPORT_FOUND: &str = "No relevant content found.";

/// A running analysis dialogue
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Subject under analysis
    subject: String,
    /// Message history, oldest first
    messages: Vec<Message>,
    /// Turns started so far
    turn_count: usize,
    /// Current state
    state: DialogueState,
    /// A terminal tool-call message is waiting for its response
    pending_terminal: bool,
}

impl Conversation {
    /// Create a conversation seeded with the task message
    pub fn new(subject: impl Into<String>, task: Message) -> Self {
        Self {
            subject: subject.into(),
            messages: vec![task],
            turn_count: 0,
            state: DialogueState::Running,
            pending_terminal: false,
        }
    }

    /// Subject under analysis
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Turns started so far
    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// Current state
    pub fn state(&self) -> &DialogueState {
        &self.state
    }

    /// Whether the dialogue has left the running state
    pub fn is_terminated(&self) -> bool {
        !self.state.is_running()
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get the last message sent by `role`
    pub fn last_from(&self, role: AgentRole) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.sender == role)
    }

    /// Feed an event to the state machine
    pub fn apply(&mut self, transition: Transition) {
        let state = std::mem::replace(&mut self.state, DialogueState::Running);
        self.state = state.next(transition);
    }

    /// Start the next turn
    pub fn begin_turn(&mut self) -> Result<usize> {
        self.ensure_open()?;
        self.turn_count += 1;
        Ok(self.turn_count)
    }

    /// Append a message and evaluate termination
    ///
    /// A terminal message that requests tools only takes effect once the
    /// response to it has been appended.
    pub fn push(&mut self, message: Message) -> Result<()> {
        self.ensure_open()?;
        let terminal = if message.is_tool_call() {
            self.pending_terminal = message.is_terminal;
            false
        } else {
            message.is_terminal || std::mem::take(&mut self.pending_terminal)
        };
        self.messages.push(message);
        self.apply(Transition::Appended { terminal });
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_terminated() {
            return Err(TradeHelperError::ConversationClosed(self.subject.clone()));
        }
        Ok(())
    }

    /// Freeze the conversation
    pub fn into_transcript(self) -> Transcript {
        Transcript {
            subject: self.subject,
            messages: self.messages,
            turn_count: self.turn_count,
            state: self.state,
        }
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Immutable record of a finished dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub subject: String,
    pub messages: Vec<Message>,
    pub turn_count: usize,
    pub state: DialogueState,
}

impl Transcript {
    /// First initiator message containing `marker`
    ///
    /// The first match wins, even when it is the task message itself.
    pub fn report_request_echo(&self, marker: &str) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.sender == AgentRole::Initiator && m.content.contains(marker))
    }

    /// Report text extracted from the transcript
    pub fn report(&self, marker: &str) -> String {
        self.report_request_echo(marker)
            .map(|m| m.content.clone())
            .unwrap_or_else(|| NO_REPORT_FOUND.to_string())
    }

    /// Messages sent by `role`
    pub fn messages_from(&self, role: AgentRole) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.sender == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        Conversation::new("ACME", Message::task("Analyze ACME"))
    }

    #[test]
    fn test_conversation_basic() {
        let mut conv = conversation();
        assert_eq!(conv.begin_turn().unwrap(), 1);
        conv.push(Message::reasoning("thinking", vec![])).unwrap();
        conv.push(Message::acknowledgement("Continue.")).unwrap();

        assert_eq!(conv.len(), 3);
        assert_eq!(conv.turn_count(), 1);
        assert_eq!(conv.last_from(AgentRole::Initiator).unwrap().content, "thinking");
        assert_eq!(conv.last().unwrap().sender, AgentRole::Proxy);
    }

    #[test]
    fn test_no_append_after_termination() {
        let mut conv = conversation();
        conv.begin_turn().unwrap();
        conv.push(Message::reasoning("done TERMINATE", vec![]).with_terminal_marker("TERMINATE"))
            .unwrap();

        assert_eq!(conv.state(), &DialogueState::TerminatedNormally);
        let err = conv.push(Message::acknowledgement("late")).unwrap_err();
        assert!(matches!(err, TradeHelperError::ConversationClosed(_)));
        assert!(conv.begin_turn().is_err());
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_terminal_tool_call_waits_for_response() {
        use crate::core::{ToolCall, ToolOutcome};

        let call = ToolCall::new("c1", "get_company_profile", serde_json::json!({"symbol": "ACME"}));
        let mut conv = conversation();
        conv.begin_turn().unwrap();
        conv.push(
            Message::reasoning("Fetching profile. TERMINATE", vec![call.clone()])
                .with_terminal_marker("TERMINATE"),
        )
        .unwrap();
        assert!(!conv.is_terminated());

        conv.push(Message::tool_response(vec![ToolOutcome::success(&call, "Acme Corp")]))
            .unwrap();
        assert_eq!(conv.state(), &DialogueState::TerminatedNormally);
        assert_eq!(conv.len(), 3);
    }

    #[test]
    fn test_report_first_match_wins() {
        let mut conv = conversation();
        conv.begin_turn().unwrap();
        conv.push(Message::reasoning("### Positive Developments\nfirst", vec![]))
            .unwrap();
        conv.push(Message::acknowledgement("### not from the analyst"))
            .unwrap();
        conv.push(Message::reasoning("### Summary\nsecond", vec![]))
            .unwrap();

        let transcript = conv.into_transcript();
        assert_eq!(transcript.report("###"), "### Positive Developments\nfirst");
    }

    #[test]
    fn test_report_task_message_can_match() {
        let conv = Conversation::new("ACME", Message::task("Format with ### headings"));
        let transcript = conv.into_transcript();
        assert_eq!(transcript.report("###"), "Format with ### headings");
    }

    #[test]
    fn test_report_without_match() {
        let transcript = conversation().into_transcript();
        assert!(transcript.report_request_echo("###").is_none());
        assert_eq!(transcript.report("###"), NO_REPORT_FOUND);
    }
}
