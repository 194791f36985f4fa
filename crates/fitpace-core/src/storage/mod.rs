mod config;
pub mod database;

pub use config::{Config, SearchConfig, TimerDefaults};
pub use database::{Database, NewSession, SessionOutcome, SessionRecord, SessionStats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `FITPACE_HOME` overrides the location outright. Otherwise this is
/// `~/.config/fitpace/`, or `~/.config/fitpace-dev/` when `FITPACE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FITPACE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FITPACE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("fitpace-dev")
            } else {
                base_dir.join("fitpace")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
