//! Session countdown.
//!
//! A fixed one-second-tick countdown. It holds no thread and no timer of
//! its own - the caller invokes `tick()` once per elapsed second, so the
//! clock composes with whatever event loop or scheduler owns it.

use serde::{Deserialize, Serialize};

/// One countdown tick.
pub const TICK_MS: u64 = 1_000;
/// Shortest allowed session.
pub const MIN_SESSION_MS: u64 = 5 * 60 * 1_000;
/// Longest allowed session.
pub const MAX_SESSION_MS: u64 = 60 * 60 * 1_000;
/// Session length used when nothing usable is stored.
pub const DEFAULT_SESSION_MS: u64 = 20 * 60 * 1_000;

/// Clamp an arbitrary length into the allowed session range.
pub fn clamp_session_ms(ms: u64) -> u64 {
    ms.clamp(MIN_SESSION_MS, MAX_SESSION_MS)
}

/// Countdown over a configured session length.
///
/// Invariant: `remaining_ms <= session_length_ms`, and `remaining_ms` only
/// changes through `tick()` while running or through an accepted length
/// change while stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    session_length_ms: u64,
    remaining_ms: u64,
    running: bool,
}

impl Countdown {
    /// Values outside the allowed range are clamped, so a stale persisted
    /// preference cannot produce an out-of-range session.
    pub fn new(session_length_ms: u64) -> Self {
        let session_length_ms = clamp_session_ms(session_length_ms);
        Self {
            session_length_ms,
            remaining_ms: session_length_ms,
            running: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session_length_ms(&self) -> u64 {
        self.session_length_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// No time has elapsed yet (fresh or freshly reset).
    pub fn is_full(&self) -> bool {
        self.remaining_ms == self.session_length_ms
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Halt and rewind to the full configured length.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_ms = self.session_length_ms;
    }

    /// Advance one tick. Returns true when the countdown just hit zero;
    /// the clock stops itself at that point.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(TICK_MS);
        if self.remaining_ms == 0 {
            self.running = false;
            true
        } else {
            false
        }
    }

    /// Set an absolute session length, resetting the remaining time to
    /// match. Rejected while running or when the value falls outside the
    /// allowed range.
    pub fn set_length(&mut self, ms: u64) -> bool {
        if self.running || !(MIN_SESSION_MS..=MAX_SESSION_MS).contains(&ms) {
            return false;
        }
        self.session_length_ms = ms;
        self.remaining_ms = ms;
        true
    }

    /// Nudge the session length by a signed delta, clamping the result into
    /// the allowed range. Rejected while running.
    pub fn adjust_by(&mut self, delta_ms: i64) -> bool {
        if self.running {
            return false;
        }
        let target = (self.session_length_ms as i64).saturating_add(delta_ms).max(0) as u64;
        let target = clamp_session_ms(target);
        self.session_length_ms = target;
        self.remaining_ms = target;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tick_only_moves_while_running() {
        let mut clock = Countdown::new(DEFAULT_SESSION_MS);
        clock.tick();
        assert_eq!(clock.remaining_ms(), DEFAULT_SESSION_MS);

        clock.start();
        clock.tick();
        assert_eq!(clock.remaining_ms(), DEFAULT_SESSION_MS - TICK_MS);

        clock.pause();
        clock.tick();
        assert_eq!(clock.remaining_ms(), DEFAULT_SESSION_MS - TICK_MS);
    }

    #[test]
    fn stops_itself_at_zero() {
        let mut clock = Countdown::new(MIN_SESSION_MS);
        clock.start();
        let mut zero_hits = 0;
        for _ in 0..(MIN_SESSION_MS / TICK_MS + 10) {
            if clock.tick() {
                zero_hits += 1;
            }
        }
        assert_eq!(zero_hits, 1);
        assert!(!clock.is_running());
        assert_eq!(clock.remaining_ms(), 0);
    }

    #[test]
    fn set_length_rejected_while_running() {
        let mut clock = Countdown::new(DEFAULT_SESSION_MS);
        clock.start();
        assert!(!clock.set_length(MIN_SESSION_MS));
        assert_eq!(clock.session_length_ms(), DEFAULT_SESSION_MS);
    }

    #[test]
    fn sixty_five_minutes_is_a_no_op() {
        let mut clock = Countdown::new(DEFAULT_SESSION_MS);
        assert!(!clock.set_length(65 * 60 * 1_000));
        assert_eq!(clock.session_length_ms(), DEFAULT_SESSION_MS);
        assert_eq!(clock.remaining_ms(), DEFAULT_SESSION_MS);
    }

    #[test]
    fn adjust_clamps_to_five_minute_floor() {
        let mut clock = Countdown::new(DEFAULT_SESSION_MS);
        assert!(clock.set_length(MIN_SESSION_MS + 60_000));
        assert!(clock.adjust_by(-5 * 60 * 1_000));
        assert_eq!(clock.session_length_ms(), MIN_SESSION_MS);
        assert_eq!(clock.remaining_ms(), MIN_SESSION_MS);
    }

    #[test]
    fn new_clamps_out_of_range_lengths() {
        assert_eq!(Countdown::new(0).session_length_ms(), MIN_SESSION_MS);
        assert_eq!(
            Countdown::new(u64::MAX).session_length_ms(),
            MAX_SESSION_MS
        );
    }

    proptest! {
        #[test]
        fn any_valid_length_is_accepted_verbatim(ms in MIN_SESSION_MS..=MAX_SESSION_MS) {
            let mut clock = Countdown::new(DEFAULT_SESSION_MS);
            prop_assert!(clock.set_length(ms));
            prop_assert_eq!(clock.session_length_ms(), ms);
            prop_assert_eq!(clock.remaining_ms(), ms);
        }

        #[test]
        fn any_invalid_length_changes_nothing(ms in prop_oneof![
            0u64..MIN_SESSION_MS,
            (MAX_SESSION_MS + 1)..=u64::MAX,
        ]) {
            let mut clock = Countdown::new(DEFAULT_SESSION_MS);
            prop_assert!(!clock.set_length(ms));
            prop_assert_eq!(clock.session_length_ms(), DEFAULT_SESSION_MS);
            prop_assert_eq!(clock.remaining_ms(), DEFAULT_SESSION_MS);
        }

        #[test]
        fn adjust_always_lands_in_range(delta in i64::MIN..=i64::MAX) {
            let mut clock = Countdown::new(DEFAULT_SESSION_MS);
            prop_assert!(clock.adjust_by(delta));
            let len = clock.session_length_ms();
            prop_assert!((MIN_SESSION_MS..=MAX_SESSION_MS).contains(&len));
            prop_assert_eq!(clock.remaining_ms(), len);
        }
    }
}
