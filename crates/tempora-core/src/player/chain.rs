//! Bell -> meditation -> bell playback chain.
//!
//! An explicit state machine driven from the outside: the owner reports
//! clip completion through [`AudioChain::on_clip_ended`] and the chain
//! decides what plays next. Pause and reset flip `active` off, so a
//! completion that was already in flight when the user paused finds
//! nothing to advance.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> OpeningBell -> Meditation -> ClosingBell -> Finished
//!           (any playing stage) -> Failed on a refused play()
//! ```
//!
//! Finished and Failed both rewind to a fresh start on the next `start()`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audio::AudioClip;
use crate::events::Event;

/// The three playing stages of a chain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStage {
    OpeningBell,
    Meditation,
    ClosingBell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    Idle,
    OpeningBell,
    Meditation,
    ClosingBell,
    Finished,
    Failed,
}

impl ChainState {
    /// The stage this state plays, if it plays one.
    pub fn stage(self) -> Option<ChainStage> {
        match self {
            ChainState::OpeningBell => Some(ChainStage::OpeningBell),
            ChainState::Meditation => Some(ChainStage::Meditation),
            ChainState::ClosingBell => Some(ChainStage::ClosingBell),
            _ => None,
        }
    }
}

/// Two clips - the bell (played at both ends) and the meditation track -
/// and the state machine that sequences them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioChain<C> {
    bell: C,
    track: C,
    state: ChainState,
    /// Clips are rolling. False in a stage state means suspended by pause().
    active: bool,
}

impl<C: AudioClip> AudioChain<C> {
    pub fn new(bell: C, track: C) -> Self {
        Self {
            bell,
            track,
            state: ChainState::Idle,
            active: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_idle(&self) -> bool {
        self.state == ChainState::Idle
    }

    /// Mid-stage but paused; `start()` will resume in place.
    pub fn is_suspended(&self) -> bool {
        !self.active && self.state.stage().is_some()
    }

    /// Wall time the full chain occupies: the bell twice plus the track.
    pub fn total_ms(&self) -> u64 {
        self.bell
            .duration_ms()
            .saturating_mul(2)
            .saturating_add(self.track.duration_ms())
    }

    pub fn bell(&self) -> &C {
        &self.bell
    }

    pub fn track(&self) -> &C {
        &self.track
    }

    /// The clip currently rolling, if any.
    pub fn active_clip(&self) -> Option<&C> {
        if !self.active {
            return None;
        }
        match self.state.stage()? {
            ChainStage::Meditation => Some(&self.track),
            _ => Some(&self.bell),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the chain, or resume a suspended stage in place.
    ///
    /// From Idle, Finished, or Failed both clips rewind to zero and the
    /// opening bell plays. From a suspended stage the stage's clip resumes
    /// at its frozen position.
    pub fn start(&mut self) -> Option<Event> {
        match self.state.stage() {
            Some(stage) => {
                if self.active {
                    return None; // already rolling
                }
                self.active = true;
                match self.clip_for(stage).play() {
                    Ok(()) => {
                        debug!(?stage, "chain resumed in place");
                        Some(Event::ChainResumed {
                            stage,
                            at: Utc::now(),
                        })
                    }
                    Err(e) => self.fail(stage, &e.to_string()),
                }
            }
            None => {
                self.bell.pause();
                self.track.pause();
                self.bell.seek_ms(0);
                self.track.seek_ms(0);
                self.state = ChainState::OpeningBell;
                self.active = true;
                debug!("chain starting from the opening bell");
                match self.bell.play() {
                    Ok(()) => Some(Event::ChainStarted { at: Utc::now() }),
                    Err(e) => self.fail(ChainStage::OpeningBell, &e.to_string()),
                }
            }
        }
    }

    /// Suspend the active stage, keeping clip positions. Idempotent.
    pub fn pause(&mut self) {
        if !self.active {
            return;
        }
        if let Some(stage) = self.state.stage() {
            self.clip_for(stage).pause();
        }
        self.active = false;
    }

    /// Abandon any in-flight chain and rewind both clips to zero.
    pub fn reset(&mut self) {
        self.bell.pause();
        self.track.pause();
        self.bell.seek_ms(0);
        self.track.seek_ms(0);
        self.state = ChainState::Idle;
        self.active = false;
    }

    /// Replace the meditation clip. Any in-flight chain is abandoned first,
    /// so nothing can keep referencing the old clip.
    pub fn set_track(&mut self, track: C) {
        self.reset();
        self.track = track;
    }

    /// Drive one step: the active stage's clip finished playing.
    ///
    /// A completion arriving after pause() or reset() finds `active` off
    /// and is dropped, so a stale event can never advance the chain. The
    /// closing bell's completion is reported exactly once.
    pub fn on_clip_ended(&mut self) -> Option<Event> {
        if !self.active {
            return None;
        }
        match self.state {
            ChainState::OpeningBell => {
                self.state = ChainState::Meditation;
                match self.track.play() {
                    Ok(()) => Some(Event::ChainAdvanced {
                        stage: ChainStage::Meditation,
                        at: Utc::now(),
                    }),
                    Err(e) => self.fail(ChainStage::Meditation, &e.to_string()),
                }
            }
            ChainState::Meditation => {
                self.bell.seek_ms(0);
                self.state = ChainState::ClosingBell;
                match self.bell.play() {
                    Ok(()) => Some(Event::ChainAdvanced {
                        stage: ChainStage::ClosingBell,
                        at: Utc::now(),
                    }),
                    Err(e) => self.fail(ChainStage::ClosingBell, &e.to_string()),
                }
            }
            ChainState::ClosingBell => {
                self.active = false;
                self.state = ChainState::Finished;
                debug!("chain completed");
                Some(Event::ChainCompleted { at: Utc::now() })
            }
            _ => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn clip_for(&mut self, stage: ChainStage) -> &mut C {
        match stage {
            ChainStage::Meditation => &mut self.track,
            _ => &mut self.bell,
        }
    }

    fn fail(&mut self, stage: ChainStage, message: &str) -> Option<Event> {
        warn!(?stage, error = message, "audio playback failed");
        self.bell.pause();
        self.track.pause();
        self.state = ChainState::Failed;
        self.active = false;
        Some(Event::AudioFailed {
            stage,
            message: message.to_string(),
            at: Utc::now(),
        })
    }
}
