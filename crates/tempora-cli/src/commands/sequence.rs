//! Sequence commands.

use clap::Subcommand;
use tempora_core::storage::Database;
use tempora_core::{CatalogStore, SequenceInput};

#[derive(Subcommand)]
pub enum SequenceAction {
    /// Create a sequence of meditations
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// Cover image URL
        #[arg(long)]
        image: Option<String>,
        /// List the sequence publicly
        #[arg(long)]
        public: bool,
        /// Ordered meditation ids, comma separated
        #[arg(long, value_delimiter = ',')]
        meditations: Vec<String>,
    },
    /// List sequences as JSON
    List {
        /// Only show public sequences
        #[arg(long)]
        public: bool,
    },
    /// Show one sequence and its meditations as JSON
    Show { sequence_id: String },
    /// Update fields of a sequence
    Update {
        sequence_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        public: Option<bool>,
        /// Replacement ordered meditation ids, comma separated
        #[arg(long, value_delimiter = ',')]
        meditations: Option<Vec<String>>,
    },
    /// Delete a sequence
    Rm { sequence_id: String },
}

pub fn run(action: SequenceAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let store = CatalogStore::new(&db);

    match action {
        SequenceAction::Create {
            name,
            description,
            image,
            public,
            meditations,
        } => {
            let input = SequenceInput {
                name,
                description,
                image_url: image,
                is_public: public,
                meditation_ids: meditations,
            };
            let sequence = store.create_sequence(&input)?;
            println!("{}", serde_json::to_string_pretty(&sequence)?);
        }
        SequenceAction::List { public } => {
            let sequences = store.list_sequences(public)?;
            println!("{}", serde_json::to_string_pretty(&sequences)?);
        }
        SequenceAction::Show { sequence_id } => match store.get_sequence(&sequence_id)? {
            Some(sequence) => {
                let meditations = store.meditations_for(&sequence)?;
                let out = serde_json::json!({
                    "sequence": sequence,
                    "meditations": meditations,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            None => {
                eprintln!("no sequence with id {sequence_id}");
                std::process::exit(1);
            }
        },
        SequenceAction::Update {
            sequence_id,
            name,
            description,
            image,
            public,
            meditations,
        } => {
            let existing = match store.get_sequence(&sequence_id)? {
                Some(s) => s,
                None => {
                    eprintln!("no sequence with id {sequence_id}");
                    std::process::exit(1);
                }
            };
            let input = SequenceInput {
                name: name.unwrap_or(existing.name),
                description: description.unwrap_or(existing.description),
                image_url: image.or(existing.image_url),
                is_public: public.unwrap_or(existing.is_public),
                meditation_ids: meditations.unwrap_or(existing.meditation_ids),
            };
            // id already checked above
            let updated = store.update_sequence(&sequence_id, &input)?.unwrap();
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        SequenceAction::Rm { sequence_id } => {
            if store.delete_sequence(&sequence_id)? {
                println!("deleted {sequence_id}");
            } else {
                eprintln!("no sequence with id {sequence_id}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
