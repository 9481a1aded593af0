//! Shared types used across tradehelper modules
//!
//! Contains message structures, tool definitions, and common data types.

use serde::{Deserialize, Serialize};

/// Which side of the dialogue sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// The reasoning agent that plans and writes the report
    Initiator,
    /// The agent that executes tool calls on the initiator's behalf
    Proxy,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Initiator => write!(f, "initiator"),
            AgentRole::Proxy => write!(f, "proxy"),
        }
    }
}

/// What a message represents in the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// The injected opening request
    Task,
    /// Output of the reasoning collaborator
    Reasoning,
    /// Results of executing the previous message's tool calls
    ToolResponse,
    /// Pass-through reply when there was nothing to execute
    Acknowledgement,
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub sender: AgentRole,
    /// Kind of message
    pub kind: MessageKind,
    /// Content of the message
    pub content: String,
    /// Tool calls requested by this message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Tool results carried by this message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolOutcome>,
    /// Whether the content carries the terminal marker
    #[serde(default)]
    pub is_terminal: bool,
}

impl Message {
    /// Create the opening task message
    pub fn task(content: impl Into<String>) -> Self {
        Self {
            sender: AgentRole::Initiator,
            kind: MessageKind::Task,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            is_terminal: false,
        }
    }

    /// Create a reasoning message, optionally requesting tool calls
    pub fn reasoning(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            sender: AgentRole::Initiator,
            kind: MessageKind::Reasoning,
            content: content.into(),
            tool_calls,
            tool_results: Vec::new(),
            is_terminal: false,
        }
    }

    /// Create a proxy message carrying tool results
    ///
    /// A single result is embedded verbatim; several are labelled by tool name.
    pub fn tool_response(results: Vec<ToolOutcome>) -> Self {
        let content = match results.as_slice() {
            [only] => only.output.clone(),
            many => many
                .iter()
                .map(|r| format!("[{}]\n{}", r.tool_name, r.output))
                .collect::<Vec<_>>()
                .join("\n\n"),
        };

        Self {
            sender: AgentRole::Proxy,
            kind: MessageKind::ToolResponse,
            content,
            tool_calls: Vec::new(),
            tool_results: results,
            is_terminal: false,
        }
    }

    /// Create a proxy pass-through acknowledgement
    pub fn acknowledgement(content: impl Into<String>) -> Self {
        Self {
            sender: AgentRole::Proxy,
            kind: MessageKind::Acknowledgement,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            is_terminal: false,
        }
    }

    /// Flag the message as terminal if its content ends with `marker`
    pub fn with_terminal_marker(mut self, marker: &str) -> Self {
        self.is_terminal = ends_with_marker(&self.content, marker);
        self
    }

    /// Whether this message requests tool execution
    pub fn is_tool_call(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Trailing-whitespace-insensitive sentinel check
pub fn ends_with_marker(content: &str, marker: &str) -> bool {
    !marker.is_empty() && content.trim_end().ends_with(marker)
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back with the result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Name of the described tool
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Result of executing one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Id of the call this answers
    pub call_id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output from the tool, or the error text
    pub output: String,
}

impl ToolOutcome {
    /// Create a successful outcome
    pub fn success(call: &ToolCall, output: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            output: output.into(),
        }
    }

    /// Create a failed outcome
    pub fn failure(call: &ToolCall, error: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: false,
            output: format!("Error: {}", error.into()),
        }
    }
}
