//! LLM module - reasoning provider integrations
//!
//! Provides the provider abstraction with an OpenAI-compatible implementation.

pub mod openai;
pub mod traits;

pub use openai::OpenAiClient;
pub use traits::{ReasoningProvider, Reply, TokenUsage};
