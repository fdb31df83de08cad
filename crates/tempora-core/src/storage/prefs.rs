//! Persisted session-length preference.

use tracing::debug;

use super::Database;
use crate::player::{clamp_session_ms, DEFAULT_SESSION_MS};

const SESSION_LENGTH_KEY: &str = "session_length_ms";

/// The session-length preference, kept in the kv table.
///
/// Reads never fail: anything missing or unreadable falls back to the
/// 20-minute default. Writes are best-effort; when one fails the in-memory
/// value simply stays authoritative for the rest of the run.
pub struct Preferences<'a> {
    db: &'a Database,
}

impl<'a> Preferences<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// The stored session length in milliseconds, clamped into the allowed
    /// range; the default when nothing usable is stored.
    pub fn session_length_ms(&self) -> u64 {
        match self.db.kv_get(SESSION_LENGTH_KEY) {
            Ok(Some(raw)) => match raw.parse::<u64>() {
                Ok(ms) => clamp_session_ms(ms),
                Err(_) => DEFAULT_SESSION_MS,
            },
            Ok(None) => DEFAULT_SESSION_MS,
            Err(e) => {
                debug!(error = %e, "session length read failed, using default");
                DEFAULT_SESSION_MS
            }
        }
    }

    /// Persist a new session length.
    pub fn save_session_length(&self, ms: u64) {
        if let Err(e) = self.db.kv_set(SESSION_LENGTH_KEY, &ms.to_string()) {
            debug!(error = %e, "session length write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{MAX_SESSION_MS, MIN_SESSION_MS};

    #[test]
    fn defaults_when_nothing_is_stored() {
        let db = Database::open_memory().unwrap();
        assert_eq!(Preferences::new(&db).session_length_ms(), DEFAULT_SESSION_MS);
    }

    #[test]
    fn roundtrips_a_saved_length() {
        let db = Database::open_memory().unwrap();
        let prefs = Preferences::new(&db);
        prefs.save_session_length(30 * 60 * 1_000);
        assert_eq!(prefs.session_length_ms(), 30 * 60 * 1_000);
    }

    #[test]
    fn unparsable_value_falls_back_to_default() {
        let db = Database::open_memory().unwrap();
        db.kv_set(SESSION_LENGTH_KEY, "twenty minutes").unwrap();
        assert_eq!(Preferences::new(&db).session_length_ms(), DEFAULT_SESSION_MS);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let db = Database::open_memory().unwrap();
        db.kv_set(SESSION_LENGTH_KEY, "1000").unwrap();
        assert_eq!(Preferences::new(&db).session_length_ms(), MIN_SESSION_MS);
        db.kv_set(SESSION_LENGTH_KEY, "999999999").unwrap();
        assert_eq!(Preferences::new(&db).session_length_ms(), MAX_SESSION_MS);
    }
}
