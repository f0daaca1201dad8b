//! Battle runner.
//!
//! Simulates battles between catalog creatures and summarizes the history
//! log they leave behind.
//!
//! Usage:
//!   cargo run -p battle_runner -- run --player pikachu --opponent squirtle
//!   cargo run -p battle_runner -- run --player pikachu --opponent squirtle --realtime
//!   cargo run -p battle_runner -- stats --history .battles/history.jsonl

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::{run, stats};

#[derive(Parser)]
#[command(name = "battle_runner")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an automatic battle between two catalog creatures
    Run(run::RunArgs),

    /// Summarize the battle history
    Stats(stats::StatsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => run::execute(args).await,
        Some(Commands::Stats(args)) => stats::execute(args),
        None => {
            // Require explicit subcommand to avoid flag ambiguity at the root.
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
