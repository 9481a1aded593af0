//! tradehelper - stock report CLI
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tradehelper::{Config, Repl, ReportService};

/// tradehelper - stock fundamentals analysis and prediction
#[derive(Parser, Debug)]
#[command(name = "tradehelper")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Company name or ticker symbol (interactive mode when omitted)
    subject: Option<String>,

    /// Model used by the analyst
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum analyst turns per report
    #[arg(long)]
    max_turns: Option<usize>,

    /// Whole-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory for cached results
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.debug {
        "tradehelper=debug"
    } else {
        "tradehelper=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(max_turns) = args.max_turns {
        config.dialogue.max_turns = max_turns;
    }
    if let Some(timeout) = args.timeout {
        config.dialogue.request_timeout_secs = timeout;
    }
    if let Some(dir) = args.cache_dir {
        config.cache.dir = dir;
    }

    tracing::info!(
        model = %config.llm.model,
        max_turns = config.dialogue.max_turns,
        cache = %config.cache.dir.display(),
        "loaded configuration"
    );

    // Single subject mode
    if let Some(subject) = args.subject {
        let service = ReportService::from_config(&config)?;
        let report = service.analyze(&subject).await?;
        println!("{}", report.text);
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(&config)?;
    repl.run().await?;

    Ok(())
}
