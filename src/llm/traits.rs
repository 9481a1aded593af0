//! Reasoning provider trait
//!
//! The analyst's next message comes from an opaque, possibly failing and
//! possibly non-deterministic collaborator behind this trait.

use async_trait::async_trait;

use crate::core::{Message, Result, ToolCall, ToolDefinition};

/// Response from a reasoning provider
#[derive(Debug, Clone, Default)]
pub struct Reply {
    /// Text content of the response
    pub content: String,
    /// Any tool calls the model wants to make
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information
    pub usage: Option<TokenUsage>,
}

impl Reply {
    /// Plain text reply
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Reply requesting tool calls
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for reasoning providers
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Produce the next initiator message
    ///
    /// `history` is the full conversation so far, oldest first. `tools` are the
    /// definitions the model may call.
    async fn generate(
        &self,
        directive: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Reply>;

    /// Get the provider name
    fn name(&self) -> &str;
}
