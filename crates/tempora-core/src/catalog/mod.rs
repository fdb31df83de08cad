//! Meditation catalog.
//!
//! Guided meditations and the sequences (ordered collections) that group
//! them. The player consumes a [`Meditation`] as an opaque value; everything
//! here is plain data plus input validation, with persistence in
//! [`CatalogStore`].

mod store;

pub use store::CatalogStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A guided meditation: spoken text plus a recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meditation {
    pub id: String,
    pub name: String,
    pub text: String,
    pub audio_url: String,
    /// Measured at ingest; the player schedules the bell chain off it.
    pub duration_secs: u64,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An ordered collection of meditations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub meditation_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeditationInput {
    pub name: String,
    pub text: String,
    pub audio_url: String,
    pub duration_secs: u64,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceInput {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub meditation_ids: Vec<String>,
}

impl MeditationInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::MissingField("text"));
        }
        if self.audio_url.trim().is_empty() {
            return Err(ValidationError::MissingField("audio_url"));
        }
        Ok(())
    }
}

impl SequenceInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.name.contains('<') || self.name.contains('>') {
            return Err(ValidationError::InvalidValue {
                field: "name",
                message: "angle brackets are not allowed".into(),
            });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingField("description"));
        }
        Ok(())
    }
}
