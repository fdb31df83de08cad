//! Session statistics commands.

use clap::Subcommand;
use tempora_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Aggregate counts and minutes, today and all-time
    Show,
    /// The most recently completed sessions
    Recent {
        #[arg(long, default_value = "10")]
        limit: u32,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Show => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit } => {
            let records = db.recent_sessions(limit)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
