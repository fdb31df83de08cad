//! Meditation catalog commands.

use std::path::Path;

use clap::Subcommand;
use tempora_core::audio::{probe_duration_ms, validate_track_duration};
use tempora_core::storage::{Config, Database};
use tempora_core::{CatalogStore, MeditationInput};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Add a meditation to the catalog
    Add {
        #[arg(long)]
        name: String,
        /// The guiding text shown while the track plays
        #[arg(long)]
        text: String,
        /// Path to a local audio file, or a URL
        #[arg(long)]
        audio: String,
        /// Recording length in seconds (measured automatically for local files)
        #[arg(long)]
        duration_secs: Option<u64>,
        /// List the meditation publicly
        #[arg(long)]
        public: bool,
    },
    /// List meditations as JSON
    List {
        /// Only show public meditations
        #[arg(long)]
        public: bool,
    },
    /// Show one meditation as JSON
    Show { meditation_id: String },
    /// Update fields of a meditation
    Update {
        meditation_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        audio: Option<String>,
        #[arg(long)]
        duration_secs: Option<u64>,
        #[arg(long)]
        public: Option<bool>,
    },
    /// Delete a meditation
    Rm { meditation_id: String },
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let store = CatalogStore::new(&db);

    match action {
        CatalogAction::Add {
            name,
            text,
            audio,
            duration_secs,
            public,
        } => {
            let duration_secs = resolve_duration_secs(&audio, duration_secs, &config)?;
            let input = MeditationInput {
                name,
                text,
                audio_url: audio,
                duration_secs,
                is_public: public,
            };
            let meditation = store.create_meditation(&input)?;
            println!("{}", serde_json::to_string_pretty(&meditation)?);
        }
        CatalogAction::List { public } => {
            let meditations = store.list_meditations(public)?;
            println!("{}", serde_json::to_string_pretty(&meditations)?);
        }
        CatalogAction::Show { meditation_id } => match store.get_meditation(&meditation_id)? {
            Some(meditation) => println!("{}", serde_json::to_string_pretty(&meditation)?),
            None => {
                eprintln!("no meditation with id {meditation_id}");
                std::process::exit(1);
            }
        },
        CatalogAction::Update {
            meditation_id,
            name,
            text,
            audio,
            duration_secs,
            public,
        } => {
            let existing = match store.get_meditation(&meditation_id)? {
                Some(m) => m,
                None => {
                    eprintln!("no meditation with id {meditation_id}");
                    std::process::exit(1);
                }
            };
            let mut input = MeditationInput {
                name: name.unwrap_or(existing.name),
                text: text.unwrap_or(existing.text),
                audio_url: existing.audio_url,
                duration_secs: existing.duration_secs,
                is_public: public.unwrap_or(existing.is_public),
            };
            if let Some(audio) = audio {
                input.duration_secs = resolve_duration_secs(&audio, duration_secs, &config)?;
                input.audio_url = audio;
            } else if let Some(secs) = duration_secs {
                validate_track_duration(secs * 1_000, config.audio.max_track_secs)?;
                input.duration_secs = secs;
            }
            // id already checked above
            let updated = store.update_meditation(&meditation_id, &input)?.unwrap();
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        CatalogAction::Rm { meditation_id } => {
            if store.delete_meditation(&meditation_id)? {
                println!("deleted {meditation_id}");
            } else {
                eprintln!("no meditation with id {meditation_id}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

/// Measure a local recording, or take the caller's word for a remote one.
fn resolve_duration_secs(
    audio: &str,
    override_secs: Option<u64>,
    config: &Config,
) -> Result<u64, Box<dyn std::error::Error>> {
    let secs = match override_secs {
        Some(secs) => secs,
        None => {
            let path = Path::new(audio);
            if path.is_file() {
                probe_duration_ms(path)? / 1_000
            } else {
                0 // remote source; length unknown until provided
            }
        }
    };
    validate_track_duration(secs * 1_000, config.audio.max_track_secs)?;
    Ok(secs)
}
