//! # Tempora Core Library
//!
//! Core business logic for Tempora, a guided-meditation session timer and
//! catalog. All operations are available through the standalone CLI binary;
//! any GUI is expected to be a thin layer over this same library.
//!
//! ## Architecture
//!
//! - **Player**: caller-driven state machines - a one-second-tick countdown
//!   and the bell -> meditation -> bell chain, wired together by a session
//!   controller that requires the caller to invoke `tick()` periodically
//! - **Audio**: the `AudioClip` playback seam, a wall-clock simulated clip,
//!   and duration probing for catalog ingest
//! - **Catalog**: meditations and sequences with input validation
//! - **Storage**: SQLite catalog/history/kv storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`PlayerSession`]: the session controller
//! - [`AudioChain`]: the chained bell playback state machine
//! - [`Countdown`]: the session countdown
//! - [`CatalogStore`]: catalog persistence
//! - [`Database`]: session history, statistics, and kv state
//! - [`Config`]: application configuration

pub mod audio;
pub mod catalog;
pub mod error;
pub mod events;
pub mod player;
pub mod storage;

pub use audio::{AudioClip, SimulatedClip};
pub use catalog::{CatalogStore, Meditation, MeditationInput, Sequence, SequenceInput};
pub use error::{
    AudioError, ConfigError, CoreError, DatabaseError, ValidationError,
};
pub use events::Event;
pub use player::{AudioChain, ChainStage, ChainState, Countdown, PlayerSession};
pub use storage::{Config, Database, Preferences};
