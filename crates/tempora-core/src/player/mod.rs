mod chain;
mod clock;
mod session;

pub use chain::{AudioChain, ChainStage, ChainState};
pub use clock::{
    clamp_session_ms, Countdown, DEFAULT_SESSION_MS, MAX_SESSION_MS, MIN_SESSION_MS, TICK_MS,
};
pub use session::{format_mm_ss, PlayerSession};
