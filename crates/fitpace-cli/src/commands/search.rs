use clap::Subcommand;
use fitpace_core::protocol::catalog;
use fitpace_core::search::{filter, RecentSearches};
use fitpace_core::storage::Database;
use fitpace_core::Config;

#[derive(Subcommand)]
pub enum SearchAction {
    /// Search the preset catalog and remember the query
    Query {
        /// Words that must all appear (case-insensitive)
        text: Vec<String>,
    },
    /// Show recent queries, newest first
    Recent,
    /// Forget all recent queries
    Clear,
}

pub fn run(action: SearchAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let limit = Config::load_or_default().search.recent_limit;

    match action {
        SearchAction::Query { text } => {
            let query = text.join(" ");
            let entries = catalog();
            let hits = filter(&entries, &query);
            println!("{}", serde_json::to_string_pretty(&hits)?);

            let mut recent = RecentSearches::load(&db, limit)?;
            recent.record(&query);
            recent.save(&db)?;
        }
        SearchAction::Recent => {
            let recent = RecentSearches::load(&db, limit)?;
            for query in recent.entries() {
                println!("{query}");
            }
        }
        SearchAction::Clear => {
            RecentSearches::forget(&db)?;
            println!("recent searches cleared");
        }
    }
    Ok(())
}
