use serde::{Deserialize, Serialize};

use super::AudioClip;
use crate::error::AudioError;

/// Wall-clock-backed clip.
///
/// The playhead advances in real time while playing; nothing is decoded or
/// rendered. Serializable, so a player session built on these clips can be
/// parked in the kv store between CLI invocations and picked up later with
/// its positions still moving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedClip {
    duration_ms: u64,
    /// Playhead as of the last play/pause/seek.
    base_ms: u64,
    /// Epoch ms of the last play/seek while playing; None when paused.
    playing_since_epoch_ms: Option<u64>,
}

impl SimulatedClip {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            base_ms: 0,
            playing_since_epoch_ms: None,
        }
    }

    fn current_position(&self) -> u64 {
        match self.playing_since_epoch_ms {
            Some(since) => {
                let elapsed = now_ms().saturating_sub(since);
                self.base_ms.saturating_add(elapsed).min(self.duration_ms)
            }
            None => self.base_ms.min(self.duration_ms),
        }
    }
}

impl AudioClip for SimulatedClip {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.playing_since_epoch_ms.is_none() {
            self.playing_since_epoch_ms = Some(now_ms());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.base_ms = self.current_position();
        self.playing_since_epoch_ms = None;
    }

    fn seek_ms(&mut self, position_ms: u64) {
        self.base_ms = position_ms.min(self.duration_ms);
        if self.playing_since_epoch_ms.is_some() {
            self.playing_since_epoch_ms = Some(now_ms());
        }
    }

    fn position_ms(&self) -> u64 {
        self.current_position()
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_paused() {
        let clip = SimulatedClip::new(5_000);
        assert_eq!(clip.position_ms(), 0);
        assert_eq!(clip.duration_ms(), 5_000);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut clip = SimulatedClip::new(5_000);
        clip.seek_ms(10_000);
        assert_eq!(clip.position_ms(), 5_000);
    }

    #[test]
    fn pause_freezes_position() {
        let mut clip = SimulatedClip::new(5_000);
        clip.seek_ms(2_000);
        clip.play().unwrap();
        clip.pause();
        let frozen = clip.position_ms();
        assert!(frozen >= 2_000);
        assert_eq!(clip.position_ms(), frozen);
    }

    #[test]
    fn survives_a_serde_roundtrip() {
        let mut clip = SimulatedClip::new(5_000);
        clip.seek_ms(1_500);
        let json = serde_json::to_string(&clip).unwrap();
        let restored: SimulatedClip = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.position_ms(), 1_500);
        assert_eq!(restored.duration_ms(), 5_000);
    }
}
