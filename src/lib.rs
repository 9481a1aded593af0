//! tradehelper - tool-using LLM analyst for daily stock reports
//!
//! A reasoning agent and a tool-executing proxy take turns until the analyst
//! has gathered enough finance data to write a markdown report. Reports are
//! cached per (ticker, date), so asking twice on the same day is free.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Reasoning provider abstraction with an OpenAI-compatible client
//! - **Tools**: Tool registry and finance data tools
//! - **Agent**: Dialogue state machine, turn executor and orchestrator
//! - **Cache**: Write-once result stores
//! - **Service**: Request entry point tying the above together
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use tradehelper::{Config, ReportService};
//!
//! #[tokio::main]
//! async fn main() -> tradehelper::Result<()> {
//!     let service = ReportService::from_config(&Config::load())?;
//!     let report = service.analyze("nvda").await?;
//!     println!("{}", report.text);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cache;
pub mod cli;
pub mod core;
pub mod llm;
pub mod service;
pub mod tools;

// Re-export commonly used items
pub use agent::{DialogueState, Orchestrator, Transcript};
pub use cache::{CacheEntry, CacheKey, ResultStore};
pub use cli::Repl;
pub use core::{Config, Result, TradeHelperError};
pub use service::{Report, ReportService};
