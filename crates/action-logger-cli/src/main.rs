use anyhow::Result;
use clap::{Parser, Subcommand};

use action_logger_core::{pipeline::DEFAULT_LIMIT, AppConfig};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "action-logger")]
#[command(author, version, about = "Record prompts, browser actions and CLI invocations into a daily log")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Claude Code UserPromptSubmit hook: record the prompt read from stdin
    Hook,
    /// Record an activity event
    Record(commands::record::RecordArgs),
    /// Print today's most recent log records
    Logs {
        /// Number of records to show, -1 for all
        #[arg(default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },
    /// Serve the get_daily_logs tool over stdio (JSON-RPC)
    Mcp,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Resolved once; everything below receives it explicitly
    let config = AppConfig::load()?;

    logging::init(&config);

    match cli.command {
        Commands::Hook => commands::hook::run(&config).await,
        Commands::Record(args) => commands::record::run(&config, args).await,
        Commands::Logs { limit } => commands::logs::run(&config, limit).await,
        Commands::Mcp => commands::mcp::run(&config).await,
    }
}
