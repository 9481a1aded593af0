//! Turn executor
//!
//! Produces the next message for whichever participant is acting: a reasoning
//! call for the initiator, tool execution or a pass-through for the proxy.

use std::sync::Arc;

use crate::agent::conversation::Conversation;
use crate::agent::participant::Participant;
use crate::core::config::DialogueConfig;
use crate::core::{AgentRole, Message, Result, ToolDefinition, TradeHelperError};
use crate::llm::ReasoningProvider;
use crate::tools::ToolRegistry;

/// Produces one message per call
pub struct TurnExecutor {
    provider: Arc<dyn ReasoningProvider>,
    tools: Arc<ToolRegistry>,
    /// Advertised to the provider on every reasoning call
    tool_definitions: Vec<ToolDefinition>,
    terminal_marker: String,
    acknowledgement: String,
}

impl TurnExecutor {
    /// Create an executor over a provider and a registry
    pub fn new(
        provider: Arc<dyn ReasoningProvider>,
        tools: Arc<ToolRegistry>,
        config: &DialogueConfig,
    ) -> Self {
        let tool_definitions = tools.definitions();
        Self {
            provider,
            tools,
            tool_definitions,
            terminal_marker: config.terminal_marker.clone(),
            acknowledgement: config.acknowledgement.clone(),
        }
    }

    /// Produce `acting`'s next message
    ///
    /// Tool failures come back as message content. Only a failed reasoning call
    /// is an error, and it is not retried.
    pub async fn step(&self, conversation: &Conversation, acting: &Participant) -> Result<Message> {
        let message = match acting.role() {
            AgentRole::Initiator => {
                let reply = self
                    .provider
                    .generate(
                        acting.directive(),
                        conversation.messages(),
                        &self.tool_definitions,
                    )
                    .await
                    .map_err(|e| {
                        TradeHelperError::orchestration(format!(
                            "{} could not reply via {}: {}",
                            acting.name(),
                            self.provider.name(),
                            e
                        ))
                    })?;
                Message::reasoning(reply.content, reply.tool_calls)
            }
            AgentRole::Proxy => match conversation.last_from(AgentRole::Initiator) {
                Some(request) if request.is_tool_call() => {
                    for call in &request.tool_calls {
                        tracing::info!(
                            subject = conversation.subject(),
                            tool = %call.name,
                            "executing tool call"
                        );
                    }
                    Message::tool_response(self.tools.execute_all(&request.tool_calls).await)
                }
                _ => Message::acknowledgement(self.acknowledgement.clone()),
            },
        };

        Ok(message.with_terminal_marker(&self.terminal_marker))
    }
}
