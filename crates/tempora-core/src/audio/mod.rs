//! Audio playback seam.
//!
//! The player never decodes or renders audio itself; it drives clips through
//! the [`AudioClip`] trait, the Rust stand-in for a browser media element.
//! [`SimulatedClip`] is the wall-clock implementation the CLI runs on;
//! [`probe_duration_ms`] reads real durations out of audio files at catalog
//! ingest time.

mod probe;
mod sim;

pub use probe::{probe_duration_ms, validate_track_duration};
pub use sim::SimulatedClip;

use crate::error::AudioError;

/// A single playable clip with a movable playhead.
///
/// `play` is the only fallible operation; everything else is
/// infallible bookkeeping. Implementations report completion to their
/// owner out of band (the session's `poll_audio`/`on_clip_ended`).
pub trait AudioClip {
    /// Begin or resume playback from the current position.
    fn play(&mut self) -> Result<(), AudioError>;

    /// Halt playback. The position is preserved for a later resume.
    fn pause(&mut self);

    /// Move the playhead. Positions past the end are clamped.
    fn seek_ms(&mut self, position_ms: u64);

    /// Current playhead position.
    fn position_ms(&self) -> u64;

    /// Total clip length.
    fn duration_ms(&self) -> u64;
}
