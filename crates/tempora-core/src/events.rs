use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::{ChainStage, ChainState};

/// Every state change in the player produces an Event.
/// The CLI prints them; a GUI would poll or subscribe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionStopped {
        at: DateTime<Utc>,
    },
    /// The countdown reached zero with the closing chain played out.
    SessionCompleted {
        session_length_ms: u64,
        at: DateTime<Utc>,
    },
    TrackSelected {
        track_id: String,
        track_name: String,
        at: DateTime<Utc>,
    },
    LengthAdjusted {
        session_length_ms: u64,
        at: DateTime<Utc>,
    },
    /// The bell chain began from the opening bell.
    ChainStarted {
        at: DateTime<Utc>,
    },
    /// A suspended chain stage resumed in place.
    ChainResumed {
        stage: ChainStage,
        at: DateTime<Utc>,
    },
    /// One stage ended and the next began.
    ChainAdvanced {
        stage: ChainStage,
        at: DateTime<Utc>,
    },
    /// The closing bell finished. Fired exactly once per run.
    ChainCompleted {
        at: DateTime<Utc>,
    },
    /// A clip refused to play; the chain is parked in the failed state.
    AudioFailed {
        stage: ChainStage,
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        running: bool,
        audio_active: bool,
        chain: ChainState,
        remaining_ms: u64,
        /// mm:ss rendering of `remaining_ms`.
        remaining: String,
        session_length_ms: u64,
        track_id: Option<String>,
        track_name: Option<String>,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
