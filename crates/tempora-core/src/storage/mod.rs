mod config;
pub mod database;
mod prefs;

pub use config::{AudioConfig, Config, SessionConfig};
pub use database::{Database, SessionRecord, Stats};
pub use prefs::Preferences;

use std::path::PathBuf;

/// Returns `~/.config/tempora[-dev]/`, creating it if needed.
///
/// Set TEMPORA_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TEMPORA_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tempora-dev")
    } else {
        base_dir.join("tempora")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
