//! Timed resumptions
//!
//! Phase changes that wait on the presentation (ball reveal, swap animation,
//! late winner reveal) are timers counted down by `tick`. Each timer is tagged
//! with the round that scheduled it; a timer whose round is no longer current
//! is dropped when it expires instead of firing.

use serde::{Deserialize, Serialize};

use super::state::RoundId;

/// What to do when a timer expires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resume {
    /// RevealingBall -> Shuffling
    BeginShuffle,
    /// Perform the next swap
    ShuffleStep,
    /// Last swap done, open guessing
    SettleShuffle,
    /// Lift the real winner after a miss
    RevealWinner,
}

/// A pending resumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// Round this timer belongs to
    pub round: RoundId,
    /// Time left before it fires (ms)
    pub remaining_ms: u32,
    pub resume: Resume,
}

impl Timer {
    pub fn new(round: RoundId, delay_ms: u32, resume: Resume) -> Self {
        Self {
            round,
            remaining_ms: delay_ms,
            resume,
        }
    }

    /// Whether the timer still belongs to `current`
    #[inline]
    pub fn is_live(&self, current: RoundId) -> bool {
        self.round == current
    }
}

/// Index of the timer that fires next (earliest, then oldest)
pub fn next_due(timers: &[Timer]) -> Option<usize> {
    timers
        .iter()
        .enumerate()
        .min_by_key(|(i, t)| (t.remaining_ms, *i))
        .map(|(i, _)| i)
}
