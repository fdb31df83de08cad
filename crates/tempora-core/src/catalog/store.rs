//! Catalog persistence.

use chrono::Utc;
use rusqlite::params;
use tracing::debug;
use uuid::Uuid;

use super::{Meditation, MeditationInput, Sequence, SequenceInput};
use crate::error::{CoreError, DatabaseError};
use crate::storage::database::parse_rfc3339;
use crate::storage::Database;

const MEDITATION_COLS: &str =
    "id, name, text, audio_url, duration_secs, is_public, created_at, updated_at";
const SEQUENCE_COLS: &str =
    "id, name, description, image_url, is_public, created_at, updated_at";

/// Catalog CRUD over the shared database.
pub struct CatalogStore<'a> {
    db: &'a Database,
}

impl<'a> CatalogStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ── Meditations ──────────────────────────────────────────────────

    pub fn create_meditation(&self, input: &MeditationInput) -> Result<Meditation, CoreError> {
        input.validate()?;
        let now = Utc::now();
        let meditation = Meditation {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            text: input.text.clone(),
            audio_url: input.audio_url.clone(),
            duration_secs: input.duration_secs,
            is_public: input.is_public,
            created_at: now,
            updated_at: now,
        };
        self.db
            .conn()
            .execute(
                "INSERT INTO meditations (id, name, text, audio_url, duration_secs, is_public, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    meditation.id,
                    meditation.name,
                    meditation.text,
                    meditation.audio_url,
                    meditation.duration_secs,
                    meditation.is_public,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        debug!(id = %meditation.id, "meditation created");
        Ok(meditation)
    }

    pub fn get_meditation(&self, id: &str) -> Result<Option<Meditation>, CoreError> {
        let sql = format!("SELECT {MEDITATION_COLS} FROM meditations WHERE id = ?1");
        let mut stmt = self.db.conn().prepare(&sql).map_err(DatabaseError::from)?;
        match stmt.query_row(params![id], row_to_meditation) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    /// Newest first. `public_only` hides private entries.
    pub fn list_meditations(&self, public_only: bool) -> Result<Vec<Meditation>, CoreError> {
        let sql = if public_only {
            format!(
                "SELECT {MEDITATION_COLS} FROM meditations WHERE is_public = 1 ORDER BY created_at DESC"
            )
        } else {
            format!("SELECT {MEDITATION_COLS} FROM meditations ORDER BY created_at DESC")
        };
        let mut stmt = self.db.conn().prepare(&sql).map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], row_to_meditation)
            .map_err(DatabaseError::from)?;
        let mut meditations = Vec::new();
        for row in rows {
            meditations.push(row.map_err(DatabaseError::from)?);
        }
        Ok(meditations)
    }

    /// Returns the updated meditation, or `None` when the id is unknown.
    pub fn update_meditation(
        &self,
        id: &str,
        input: &MeditationInput,
    ) -> Result<Option<Meditation>, CoreError> {
        input.validate()?;
        let changed = self
            .db
            .conn()
            .execute(
                "UPDATE meditations
                 SET name = ?1, text = ?2, audio_url = ?3, duration_secs = ?4, is_public = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    input.name,
                    input.text,
                    input.audio_url,
                    input.duration_secs,
                    input.is_public,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(DatabaseError::from)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_meditation(id)
    }

    /// Deletes the meditation and detaches it from every sequence.
    /// Returns false when the id is unknown.
    pub fn delete_meditation(&self, id: &str) -> Result<bool, CoreError> {
        self.db
            .conn()
            .execute(
                "DELETE FROM sequence_meditations WHERE meditation_id = ?1",
                params![id],
            )
            .map_err(DatabaseError::from)?;
        let changed = self
            .db
            .conn()
            .execute("DELETE FROM meditations WHERE id = ?1", params![id])
            .map_err(DatabaseError::from)?;
        Ok(changed > 0)
    }

    // ── Sequences ────────────────────────────────────────────────────

    pub fn create_sequence(&self, input: &SequenceInput) -> Result<Sequence, CoreError> {
        input.validate()?;
        let now = Utc::now();
        let sequence = Sequence {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            description: input.description.clone(),
            image_url: input.image_url.clone(),
            is_public: input.is_public,
            meditation_ids: input.meditation_ids.clone(),
            created_at: now,
            updated_at: now,
        };
        self.db
            .conn()
            .execute(
                "INSERT INTO sequences (id, name, description, image_url, is_public, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    sequence.id,
                    sequence.name,
                    sequence.description,
                    sequence.image_url,
                    sequence.is_public,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        self.replace_members(&sequence.id, &sequence.meditation_ids)?;
        debug!(id = %sequence.id, "sequence created");
        Ok(sequence)
    }

    pub fn get_sequence(&self, id: &str) -> Result<Option<Sequence>, CoreError> {
        let sql = format!("SELECT {SEQUENCE_COLS} FROM sequences WHERE id = ?1");
        let mut stmt = self.db.conn().prepare(&sql).map_err(DatabaseError::from)?;
        let row = match stmt.query_row(params![id], row_to_sequence) {
            Ok(s) => s,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(DatabaseError::from(e).into()),
        };
        let mut sequence = row;
        sequence.meditation_ids = self.member_ids(id)?;
        Ok(Some(sequence))
    }

    pub fn list_sequences(&self, public_only: bool) -> Result<Vec<Sequence>, CoreError> {
        let sql = if public_only {
            format!(
                "SELECT {SEQUENCE_COLS} FROM sequences WHERE is_public = 1 ORDER BY created_at DESC"
            )
        } else {
            format!("SELECT {SEQUENCE_COLS} FROM sequences ORDER BY created_at DESC")
        };
        let mut stmt = self.db.conn().prepare(&sql).map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], row_to_sequence)
            .map_err(DatabaseError::from)?;
        let mut sequences = Vec::new();
        for row in rows {
            let mut sequence = row.map_err(DatabaseError::from)?;
            sequence.meditation_ids = self.member_ids(&sequence.id)?;
            sequences.push(sequence);
        }
        Ok(sequences)
    }

    pub fn update_sequence(
        &self,
        id: &str,
        input: &SequenceInput,
    ) -> Result<Option<Sequence>, CoreError> {
        input.validate()?;
        let changed = self
            .db
            .conn()
            .execute(
                "UPDATE sequences
                 SET name = ?1, description = ?2, image_url = ?3, is_public = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    input.name,
                    input.description,
                    input.image_url,
                    input.is_public,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )
            .map_err(DatabaseError::from)?;
        if changed == 0 {
            return Ok(None);
        }
        self.replace_members(id, &input.meditation_ids)?;
        self.get_sequence(id)
    }

    pub fn delete_sequence(&self, id: &str) -> Result<bool, CoreError> {
        self.db
            .conn()
            .execute(
                "DELETE FROM sequence_meditations WHERE sequence_id = ?1",
                params![id],
            )
            .map_err(DatabaseError::from)?;
        let changed = self
            .db
            .conn()
            .execute("DELETE FROM sequences WHERE id = ?1", params![id])
            .map_err(DatabaseError::from)?;
        Ok(changed > 0)
    }

    /// Resolve a sequence's members, skipping ids that no longer exist.
    pub fn meditations_for(&self, sequence: &Sequence) -> Result<Vec<Meditation>, CoreError> {
        let mut meditations = Vec::with_capacity(sequence.meditation_ids.len());
        for id in &sequence.meditation_ids {
            if let Some(m) = self.get_meditation(id)? {
                meditations.push(m);
            }
        }
        Ok(meditations)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn member_ids(&self, sequence_id: &str) -> Result<Vec<String>, CoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare(
                "SELECT meditation_id FROM sequence_meditations
                 WHERE sequence_id = ?1 ORDER BY position",
            )
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![sequence_id], |row| row.get::<_, String>(0))
            .map_err(DatabaseError::from)?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(DatabaseError::from)?);
        }
        Ok(ids)
    }

    fn replace_members(&self, sequence_id: &str, meditation_ids: &[String]) -> Result<(), CoreError> {
        self.db
            .conn()
            .execute(
                "DELETE FROM sequence_meditations WHERE sequence_id = ?1",
                params![sequence_id],
            )
            .map_err(DatabaseError::from)?;
        for (position, meditation_id) in meditation_ids.iter().enumerate() {
            self.db
                .conn()
                .execute(
                    "INSERT INTO sequence_meditations (sequence_id, meditation_id, position)
                     VALUES (?1, ?2, ?3)",
                    params![sequence_id, meditation_id, position as i64],
                )
                .map_err(DatabaseError::from)?;
        }
        Ok(())
    }
}

fn row_to_meditation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Meditation> {
    Ok(Meditation {
        id: row.get(0)?,
        name: row.get(1)?,
        text: row.get(2)?,
        audio_url: row.get(3)?,
        duration_secs: row.get(4)?,
        is_public: row.get(5)?,
        created_at: parse_rfc3339(row.get::<_, String>(6)?, 6)?,
        updated_at: parse_rfc3339(row.get::<_, String>(7)?, 7)?,
    })
}

fn row_to_sequence(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sequence> {
    Ok(Sequence {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        image_url: row.get(3)?,
        is_public: row.get(4)?,
        meditation_ids: Vec::new(),
        created_at: parse_rfc3339(row.get::<_, String>(5)?, 5)?,
        updated_at: parse_rfc3339(row.get::<_, String>(6)?, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meditation_input(name: &str, public: bool) -> MeditationInput {
        MeditationInput {
            name: name.into(),
            text: "Sit comfortably and follow the breath.".into(),
            audio_url: format!("audio/{name}.mp3"),
            duration_secs: 60,
            is_public: public,
        }
    }

    #[test]
    fn meditation_roundtrip() {
        let db = Database::open_memory().unwrap();
        let store = CatalogStore::new(&db);

        let created = store.create_meditation(&meditation_input("stillness", true)).unwrap();
        let fetched = store.get_meditation(&created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "stillness");
        assert_eq!(fetched.duration_secs, 60);
        assert!(fetched.is_public);
    }

    #[test]
    fn public_listing_hides_private_entries() {
        let db = Database::open_memory().unwrap();
        let store = CatalogStore::new(&db);
        store.create_meditation(&meditation_input("public", true)).unwrap();
        store.create_meditation(&meditation_input("private", false)).unwrap();

        assert_eq!(store.list_meditations(false).unwrap().len(), 2);
        let public = store.list_meditations(true).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "public");
    }

    #[test]
    fn update_replaces_fields_and_bumps_updated_at() {
        let db = Database::open_memory().unwrap();
        let store = CatalogStore::new(&db);
        let created = store.create_meditation(&meditation_input("draft", false)).unwrap();

        let mut input = meditation_input("final", true);
        input.duration_secs = 75;
        let updated = store.update_meditation(&created.id, &input).unwrap().unwrap();
        assert_eq!(updated.name, "final");
        assert_eq!(updated.duration_secs, 75);
        assert!(updated.is_public);
        assert!(updated.updated_at >= created.updated_at);

        assert!(store.update_meditation("missing", &input).unwrap().is_none());
    }

    #[test]
    fn invalid_input_is_rejected() {
        let db = Database::open_memory().unwrap();
        let store = CatalogStore::new(&db);
        let mut input = meditation_input("x", false);
        input.text.clear();
        assert!(store.create_meditation(&input).is_err());
    }

    #[test]
    fn sequence_keeps_member_order() {
        let db = Database::open_memory().unwrap();
        let store = CatalogStore::new(&db);
        let a = store.create_meditation(&meditation_input("a", true)).unwrap();
        let b = store.create_meditation(&meditation_input("b", true)).unwrap();

        let seq = store
            .create_sequence(&SequenceInput {
                name: "Evening wind-down".into(),
                description: "Two short sits".into(),
                image_url: None,
                is_public: true,
                meditation_ids: vec![b.id.clone(), a.id.clone()],
            })
            .unwrap();

        let fetched = store.get_sequence(&seq.id).unwrap().unwrap();
        assert_eq!(fetched.meditation_ids, vec![b.id.clone(), a.id.clone()]);

        let members = store.meditations_for(&fetched).unwrap();
        assert_eq!(members[0].name, "b");
        assert_eq!(members[1].name, "a");
    }

    #[test]
    fn deleting_a_meditation_detaches_it_from_sequences() {
        let db = Database::open_memory().unwrap();
        let store = CatalogStore::new(&db);
        let a = store.create_meditation(&meditation_input("a", true)).unwrap();
        let b = store.create_meditation(&meditation_input("b", true)).unwrap();
        let seq = store
            .create_sequence(&SequenceInput {
                name: "Pair".into(),
                description: "Both".into(),
                image_url: None,
                is_public: false,
                meditation_ids: vec![a.id.clone(), b.id.clone()],
            })
            .unwrap();

        assert!(store.delete_meditation(&a.id).unwrap());
        let fetched = store.get_sequence(&seq.id).unwrap().unwrap();
        assert_eq!(fetched.meditation_ids, vec![b.id.clone()]);
    }

    #[test]
    fn delete_sequence_leaves_meditations_alone() {
        let db = Database::open_memory().unwrap();
        let store = CatalogStore::new(&db);
        let a = store.create_meditation(&meditation_input("a", true)).unwrap();
        let seq = store
            .create_sequence(&SequenceInput {
                name: "Solo".into(),
                description: "One sit".into(),
                image_url: None,
                is_public: false,
                meditation_ids: vec![a.id.clone()],
            })
            .unwrap();

        assert!(store.delete_sequence(&seq.id).unwrap());
        assert!(store.get_sequence(&seq.id).unwrap().is_none());
        assert!(store.get_meditation(&a.id).unwrap().is_some());
    }
}
