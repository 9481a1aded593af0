//! CLI module - command-line interface
//!
//! Contains the REPL and command handling.

pub mod commands;
pub mod repl;

pub use repl::Repl;
