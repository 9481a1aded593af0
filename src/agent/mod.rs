//! Agent module - dialogue orchestration and conversation management
//!
//! Contains the two-agent loop that turns a subject into a report transcript.

pub mod conversation;
pub mod executor;
pub mod loop_state;
pub mod orchestrator;
pub mod participant;
pub mod prompt;

pub use conversation::{Conversation, Transcript, NO_REPORT_FOUND};
pub use executor::TurnExecutor;
pub use loop_state::{DialogueState, Transition};
pub use orchestrator::Orchestrator;
pub use participant::Participant;
