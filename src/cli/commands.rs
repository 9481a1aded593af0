//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::service::ReportService;

/// Result of parsing a line of input
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Analyze the given subject
    Analyze(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub fn handle_command(input: &str, service: &ReportService) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::None;
    }

    let cmd = input.trim_start_matches('/').to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" => CommandResult::Exit,

        "help" | "?" => CommandResult::Handled(help_text()),

        "status" => CommandResult::Handled(format!(
            "tradehelper status:\n\
             ─────────────────────────────\n\
             Max turns:    {}\n\
             Timeout:      {}s\n\
             Results:      {}",
            service.max_turns(),
            service.request_timeout().as_secs(),
            service.store_description()
        )),

        _ if input.starts_with('/') => CommandResult::Handled(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            cmd
        )),

        _ => CommandResult::Analyze(input.to_string()),
    }
}

/// Help text for the REPL
fn help_text() -> String {
    "Enter a company name or ticker symbol to get a report.\n\
     Reports are cached per ticker and day.\n\n\
     Commands:\n\
     \x20 help     Show this help\n\
     \x20 status   Show dialogue and cache settings\n\
     \x20 exit     Leave tradehelper"
        .to_string()
}
