use clap::Subcommand;
use fitpace_core::format::{format_clock, format_compact};
use fitpace_core::storage::Database;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Recently finished sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Print one human-readable line per session instead of JSON
        #[arg(long)]
        plain: bool,
    },
    /// All-time totals
    Stats,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit, plain } => {
            let sessions = db.recent_sessions(limit)?;
            if plain {
                for s in &sessions {
                    println!(
                        "{}  {:<10} {:<24} {} / {}  {:?}",
                        s.ended_at.format("%Y-%m-%d %H:%M"),
                        s.kind.to_string(),
                        s.label,
                        format_clock(s.elapsed_secs),
                        format_clock(s.total_secs),
                        s.outcome,
                    );
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            }
        }
        HistoryAction::Stats => {
            let stats = db.stats()?;
            tracing::debug!(
                total = %format_compact(stats.total_elapsed_secs),
                "history stats"
            );
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
