//! Session controller.
//!
//! Wires the countdown and the bell chain together behind the play / pause /
//! stop / select surface the presentation layer drives. One `PlayerSession`
//! value is the whole player state: it serializes as a unit, which is how
//! the CLI parks it in the kv store between invocations.
//!
//! The countdown runs the show. The chain stays idle through most of a
//! session and is kicked off by `tick()` once the remaining time is exactly
//! enough to fit bell + track + bell, so the closing bell dies out as the
//! countdown reaches zero.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::chain::AudioChain;
use super::clock::Countdown;
use crate::audio::AudioClip;
use crate::catalog::Meditation;
use crate::events::Event;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSession<C> {
    clock: Countdown,
    chain: AudioChain<C>,
    track: Option<Meditation>,
}

impl<C: AudioClip> PlayerSession<C> {
    /// A session over the given bell and meditation clips. No track
    /// metadata is attached until `select_track`.
    pub fn new(session_length_ms: u64, bell: C, track_clip: C) -> Self {
        Self {
            clock: Countdown::new(session_length_ms),
            chain: AudioChain::new(bell, track_clip),
            track: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn clock(&self) -> &Countdown {
        &self.clock
    }

    pub fn chain(&self) -> &AudioChain<C> {
        &self.chain
    }

    pub fn track(&self) -> Option<&Meditation> {
        self.track.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.clock.remaining_ms()
    }

    pub fn session_length_ms(&self) -> u64 {
        self.clock.session_length_ms()
    }

    /// Full observable state for the presentation layer.
    pub fn snapshot(&self) -> Event {
        let length = self.clock.session_length_ms();
        let remaining = self.clock.remaining_ms();
        let progress_pct = if length == 0 {
            0.0
        } else {
            (1.0 - remaining as f64 / length as f64) * 100.0
        };
        Event::StateSnapshot {
            running: self.clock.is_running(),
            audio_active: self.chain.is_active(),
            chain: self.chain.state(),
            remaining_ms: remaining,
            remaining: format_mm_ss(remaining),
            session_length_ms: length,
            track_id: self.track.as_ref().map(|t| t.id.clone()),
            track_name: self.track.as_ref().map(|t| t.name.clone()),
            progress_pct,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Play when paused or stopped, pause when playing. Pausing freezes
    /// the remaining time and every clip position.
    pub fn toggle_play_pause(&mut self) -> Option<Event> {
        if self.clock.is_running() {
            self.clock.pause();
            self.chain.pause();
            return Some(Event::SessionPaused {
                remaining_ms: self.clock.remaining_ms(),
                at: Utc::now(),
            });
        }

        let fresh = self.clock.is_full();
        self.clock.start();
        if self.chain.is_suspended() {
            if let Some(evt @ Event::AudioFailed { .. }) = self.chain.start() {
                self.clock.pause();
                return Some(evt);
            }
        }
        let remaining_ms = self.clock.remaining_ms();
        if fresh {
            info!(remaining_ms, "session started");
            Some(Event::SessionStarted {
                remaining_ms,
                at: Utc::now(),
            })
        } else {
            Some(Event::SessionResumed {
                remaining_ms,
                at: Utc::now(),
            })
        }
    }

    /// Halt everything, rewind the audio, restore the full session length.
    pub fn stop(&mut self) -> Option<Event> {
        self.clock.reset();
        self.chain.reset();
        Some(Event::SessionStopped { at: Utc::now() })
    }

    /// Advance the countdown by one tick.
    ///
    /// Returns whatever the tick produced: the chain auto-start once the
    /// remaining time fits bell + track + bell, a playback failure, or the
    /// completion at zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.clock.is_running() {
            return None;
        }
        if self.clock.tick() {
            let session_length_ms = self.clock.session_length_ms();
            self.clock.reset();
            self.chain.reset();
            info!(session_length_ms, "session completed");
            return Some(Event::SessionCompleted {
                session_length_ms,
                at: Utc::now(),
            });
        }
        if self.chain.is_idle() && self.clock.remaining_ms() <= self.chain.total_ms() {
            let evt = self.chain.start();
            if matches!(evt, Some(Event::AudioFailed { .. })) {
                self.clock.pause();
            }
            return evt;
        }
        None
    }

    /// Report that the chain's active clip finished playing.
    pub fn on_clip_ended(&mut self) -> Option<Event> {
        self.chain.on_clip_ended()
    }

    /// Pull variant of [`Self::on_clip_ended`]: advance the chain if the
    /// active clip's playhead has run out. For drivers that poll clip
    /// positions instead of receiving completion callbacks.
    pub fn poll_audio(&mut self) -> Option<Event> {
        let ended = self
            .chain
            .active_clip()
            .map(|c| c.position_ms() >= c.duration_ms())
            .unwrap_or(false);
        if ended {
            self.chain.on_clip_ended()
        } else {
            None
        }
    }

    /// Set an absolute session length. `None` means the change was
    /// rejected (running, or outside the allowed range).
    pub fn set_length(&mut self, ms: u64) -> Option<Event> {
        if !self.clock.set_length(ms) {
            return None;
        }
        Some(Event::LengthAdjusted {
            session_length_ms: ms,
            at: Utc::now(),
        })
    }

    /// Nudge the session length by a signed delta, clamped into the
    /// allowed range. `None` means the change was rejected (running).
    pub fn adjust_length_by(&mut self, delta_ms: i64) -> Option<Event> {
        if !self.clock.adjust_by(delta_ms) {
            return None;
        }
        Some(Event::LengthAdjusted {
            session_length_ms: self.clock.session_length_ms(),
            at: Utc::now(),
        })
    }

    /// Swap the current meditation. An in-progress session is stopped
    /// first - no cross-fade, no queued transition.
    pub fn select_track(&mut self, meditation: Meditation, clip: C) -> Option<Event> {
        self.clock.reset();
        self.chain.set_track(clip);
        info!(track = %meditation.name, "track selected");
        let evt = Event::TrackSelected {
            track_id: meditation.id.clone(),
            track_name: meditation.name.clone(),
            at: Utc::now(),
        };
        self.track = Some(meditation);
        Some(evt)
    }
}

/// Format milliseconds as mm:ss.
pub fn format_mm_ss(ms: u64) -> String {
    let total_secs = ms / 1_000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testclip::TestClip;
    use crate::player::{ChainState, DEFAULT_SESSION_MS, MIN_SESSION_MS};

    fn session() -> PlayerSession<TestClip> {
        PlayerSession::new(DEFAULT_SESSION_MS, TestClip::new(3_000), TestClip::new(600_000))
    }

    #[test]
    fn toggle_starts_then_pauses() {
        let mut s = session();
        assert!(matches!(
            s.toggle_play_pause(),
            Some(Event::SessionStarted { .. })
        ));
        assert!(s.is_running());

        assert!(matches!(
            s.toggle_play_pause(),
            Some(Event::SessionPaused { .. })
        ));
        assert!(!s.is_running());
    }

    #[test]
    fn immediate_pause_leaves_everything_frozen() {
        let mut s = session();
        s.toggle_play_pause();
        s.toggle_play_pause();
        assert_eq!(s.remaining_ms(), DEFAULT_SESSION_MS);
        assert_eq!(s.chain().bell().position_ms, 0);
        assert_eq!(s.chain().track().position_ms, 0);

        // pausing again changes nothing
        let before = s.remaining_ms();
        s.toggle_play_pause();
        s.toggle_play_pause();
        assert_eq!(s.remaining_ms(), before);
    }

    #[test]
    fn resume_after_pause_reports_resumed() {
        let mut s = session();
        s.toggle_play_pause();
        s.tick();
        s.toggle_play_pause();
        assert!(matches!(
            s.toggle_play_pause(),
            Some(Event::SessionResumed { .. })
        ));
    }

    #[test]
    fn chain_auto_starts_when_remaining_fits_the_chain() {
        // 5-minute session against a 606s chain: the very first tick is
        // already inside the window.
        let mut s = PlayerSession::new(
            MIN_SESSION_MS,
            TestClip::new(3_000),
            TestClip::new(600_000),
        );
        s.toggle_play_pause();
        let evt = s.tick();
        assert!(matches!(evt, Some(Event::ChainStarted { .. })));
        assert_eq!(s.chain().state(), ChainState::OpeningBell);

        // no re-trigger while the chain is running
        assert!(s.tick().is_none());
    }

    #[test]
    fn stop_restores_the_full_length_and_rewinds_audio() {
        let mut s = session();
        s.toggle_play_pause();
        for _ in 0..10 {
            s.tick();
        }
        assert_eq!(s.remaining_ms(), DEFAULT_SESSION_MS - 10_000);

        s.stop();
        assert!(!s.is_running());
        assert_eq!(s.remaining_ms(), DEFAULT_SESSION_MS);
        assert_eq!(s.chain().state(), ChainState::Idle);
        assert_eq!(s.chain().bell().position_ms, 0);
    }

    #[test]
    fn length_changes_rejected_while_running() {
        let mut s = session();
        s.toggle_play_pause();
        assert!(s.set_length(MIN_SESSION_MS).is_none());
        assert!(s.adjust_length_by(-60_000).is_none());
        assert_eq!(s.session_length_ms(), DEFAULT_SESSION_MS);
    }

    #[test]
    fn select_track_stops_the_session_and_swaps_the_clip() {
        let mut s = session();
        s.toggle_play_pause();
        s.tick();

        let m = Meditation {
            id: "m-1".into(),
            name: "Evening stillness".into(),
            text: "Sit and breathe.".into(),
            audio_url: "https://example.org/audio/m-1.mp3".into(),
            duration_secs: 120,
            is_public: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let evt = s.select_track(m, TestClip::new(120_000));
        assert!(matches!(evt, Some(Event::TrackSelected { .. })));
        assert!(!s.is_running());
        assert_eq!(s.remaining_ms(), DEFAULT_SESSION_MS);
        assert_eq!(s.chain().track().duration_ms, 120_000);
        assert_eq!(s.track().unwrap().id, "m-1");
    }

    #[test]
    fn playback_failure_pauses_the_clock_and_surfaces() {
        let mut bell = TestClip::new(3_000);
        bell.fail_play = true;
        let mut s = PlayerSession::new(MIN_SESSION_MS, bell, TestClip::new(600_000));
        s.toggle_play_pause();
        let evt = s.tick(); // lookahead fires, bell refuses to play
        assert!(matches!(evt, Some(Event::AudioFailed { .. })));
        assert!(!s.is_running());
        assert_eq!(s.chain().state(), ChainState::Failed);
    }

    #[test]
    fn snapshot_formats_remaining_time() {
        let s = session();
        match s.snapshot() {
            Event::StateSnapshot {
                remaining,
                remaining_ms,
                running,
                ..
            } => {
                assert_eq!(remaining, "20:00");
                assert_eq!(remaining_ms, DEFAULT_SESSION_MS);
                assert!(!running);
            }
            _ => panic!("expected StateSnapshot"),
        }
    }

    #[test]
    fn mm_ss_rendering() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(61_000), "01:01");
        assert_eq!(format_mm_ss(606_000), "10:06");
        assert_eq!(format_mm_ss(3_600_000), "60:00");
    }
}
