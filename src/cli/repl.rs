//! Interactive REPL for tradehelper
//!
//! Reads one subject per line and prints its report.

use std::io::{self, BufRead, Write};

use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, Result};
use crate::service::ReportService;

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    service: ReportService,
}

impl Repl {
    /// Create a REPL over an existing service
    pub fn new(service: ReportService) -> Self {
        Self { service }
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ReportService::from_config(config)?))
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("Ticker: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            match handle_command(&input, &self.service) {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Handled(output) => println!("{}\n", output),
                CommandResult::None => continue,
                CommandResult::Analyze(subject) => {
                    println!("Analyzing {}...", subject.trim().to_uppercase());
                    match self.service.analyze(&subject).await {
                        Ok(report) => {
                            let origin = if report.cached { "cached" } else { "new" };
                            println!(
                                "\n[{} {} - {}]\n\n{}\n",
                                report.subject, report.date, origin, report.text
                            );
                        }
                        Err(e) => eprintln!("\nError: {}\n", e),
                    }
                }
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!("tradehelper - stock fundamentals analysis and prediction");
        println!("Results: {}", self.service.store_description());
        println!("Commands: help, status, exit");
        println!("─────────────────────────────────────────────────────────");
    }
}
