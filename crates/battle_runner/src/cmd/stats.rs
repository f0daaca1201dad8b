use std::path::PathBuf;

use anyhow::{Context, Result};
use battle_engine::history::{HistorySummary, JsonLinesHistory};
use clap::Args;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// History log written by `run --history`
    #[arg(long, default_value = ".battles/history.jsonl")]
    pub history: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: StatsArgs) -> Result<()> {
    let store = JsonLinesHistory::open_read_only(&args.history);
    let summary = HistorySummary::load(&store)
        .with_context(|| format!("reading history {}", args.history.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n=== Battle Statistics ===");
    println!("Total battles: {}", summary.total_battles);

    println!("\nTop winners:");
    if summary.top_winners.is_empty() {
        println!("  (none yet)");
    }
    for (rank, tally) in summary.top_winners.iter().enumerate() {
        println!(
            "  {}. {} ({} {})",
            rank + 1,
            tally.name,
            tally.wins,
            if tally.wins == 1 { "win" } else { "wins" }
        );
    }

    println!("\nRecent battles:");
    if summary.recent.is_empty() {
        println!("  (none yet)");
    }
    for record in &summary.recent {
        println!(
            "  {}  {} defeated {}",
            record.date.format("%Y-%m-%d %H:%M"),
            record.winner,
            record.loser
        );
    }
    Ok(())
}
