//! Dialogue orchestrator
//!
//! Drives the analyst and the proxy in alternating turns until the analyst
//! signals completion, the turn budget runs out, or a turn fails.
//!
//! One turn is an analyst message followed by the proxy's reply to it. The
//! termination check runs after every appended message, so a terminal analyst
//! message ends the turn before the proxy acts, unless it requests tools: those
//! are answered first.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::agent::conversation::{Conversation, Transcript};
use crate::agent::executor::TurnExecutor;
use crate::agent::loop_state::Transition;
use crate::agent::participant::Participant;
use crate::agent::prompt;
use crate::core::config::DialogueConfig;
use crate::core::Message;
use crate::llm::ReasoningProvider;
use crate::tools::ToolRegistry;

/// Runs one bounded analyst/proxy dialogue per call
pub struct Orchestrator {
    executor: TurnExecutor,
    analyst: Participant,
    proxy: Participant,
    max_turns: usize,
    report_language: String,
}

impl Orchestrator {
    /// Create an orchestrator from its collaborators and dialogue policy
    pub fn new(
        provider: Arc<dyn ReasoningProvider>,
        tools: Arc<ToolRegistry>,
        config: &DialogueConfig,
    ) -> Self {
        Self {
            executor: TurnExecutor::new(provider, tools, config),
            analyst: Participant::initiator(
                prompt::ANALYST_NAME,
                prompt::analyst_directive(&config.terminal_marker),
            ),
            proxy: Participant::proxy(prompt::PROXY_NAME),
            max_turns: config.max_turns,
            report_language: config.report_language.clone(),
        }
    }

    /// Maximum turns per run
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// The injected opening message for `subject` on `date`
    pub fn task_message(&self, subject: &str, date: NaiveDate) -> Message {
        Message::task(prompt::task_prompt(subject, date, &self.report_language))
    }

    /// Run a dialogue to completion
    ///
    /// Always returns the transcript; a failed run carries
    /// [`DialogueState::Failed`](crate::agent::DialogueState::Failed) and the
    /// messages appended before the failure.
    pub async fn run(&self, subject: &str, date: NaiveDate) -> Transcript {
        let mut conversation = Conversation::new(subject, self.task_message(subject, date));

        tracing::info!(
            subject,
            max_turns = self.max_turns,
            "starting dialogue"
        );

        loop {
            conversation.apply(Transition::BudgetCheck {
                turn_count: conversation.turn_count(),
                max_turns: self.max_turns,
            });
            if conversation.is_terminated() {
                break;
            }

            let turn = match conversation.begin_turn() {
                Ok(turn) => turn,
                Err(_) => break,
            };

            for participant in [&self.analyst, &self.proxy] {
                match self.executor.step(&conversation, participant).await {
                    Ok(message) => {
                        tracing::debug!(
                            subject,
                            turn,
                            agent = participant.name(),
                            tool_calls = message.tool_calls.len(),
                            terminal = message.is_terminal,
                            "appending message"
                        );
                        if let Err(e) = conversation.push(message) {
                            tracing::warn!(subject, error = %e, "dropped message");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(subject, turn, error = %e, "turn failed");
                        conversation.apply(Transition::ExecutorFailed(e.to_string()));
                    }
                }

                if conversation.is_terminated() {
                    break;
                }
            }
        }

        let transcript = conversation.into_transcript();
        tracing::info!(
            subject,
            turns = transcript.turn_count,
            messages = transcript.messages.len(),
            state = %transcript.state,
            "dialogue finished"
        );
        transcript
    }
}
