//! Custom error types for tradehelper
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for tradehelper operations
#[derive(Error, Debug)]
pub enum TradeHelperError {
    /// A tool with this name is already registered
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// No tool is registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments do not match the tool's declared parameters
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool itself failed
    #[error("Tool '{tool}' failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The dialogue could not complete (timeout or reasoning failure)
    #[error("Orchestration failed: {0}")]
    Orchestration(String),

    /// A cache entry already exists for this key
    #[error("Result for {subject} on {date} already exists")]
    AlreadyExists { subject: String, date: String },

    /// Append attempted after the conversation terminated
    #[error("Conversation for {0} is already terminated")]
    ConversationClosed(String),

    /// Request subject was empty after normalization
    #[error("Invalid subject: {0:?}")]
    InvalidSubject(String),

    /// Reasoning provider connection or API errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for tradehelper operations
pub type Result<T> = std::result::Result<T, TradeHelperError>;

impl TradeHelperError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an orchestration error
    pub fn orchestration(msg: impl Into<String>) -> Self {
        Self::Orchestration(msg.into())
    }

    /// Create an invalid-arguments error
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a tool's own failure
    pub fn tool_execution<E>(tool: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ToolExecution {
            tool: tool.into(),
            source: Box::new(error),
        }
    }

    /// Whether this error is the cache's write-once rejection
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
