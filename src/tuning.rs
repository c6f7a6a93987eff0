//! Pacing and difficulty tuning
//!
//! Defaults match `crate::consts`. A page can override them through its URL
//! query string (`?shuffles=8&step_ms=300`) or a JSON blob.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Tunable game balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Swaps at streak 0 (each win adds one)
    pub base_shuffle_count: u32,
    /// Delay before each swap (ms)
    pub shuffle_step_ms: u32,
    /// Ball-showing time before shuffling (ms)
    pub reveal_delay_ms: u32,
    /// Delay before revealing the winner after a miss (ms)
    pub wrong_guess_reveal_ms: u32,
    /// Cups at streak 0
    pub base_cups: usize,
    /// Streak needed per extra cup
    pub streak_per_extra_cup: u32,
    /// Hard cap on cups per round
    pub max_cups: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_shuffle_count: BASE_SHUFFLE_COUNT,
            shuffle_step_ms: SHUFFLE_STEP_MS,
            reveal_delay_ms: REVEAL_DELAY_MS,
            wrong_guess_reveal_ms: WRONG_GUESS_REVEAL_MS,
            base_cups: BASE_CUPS,
            streak_per_extra_cup: STREAK_PER_EXTRA_CUP,
            max_cups: MAX_CUPS,
        }
    }
}

impl Tuning {
    /// Parse from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Tuning>(json).map(Tuning::sanitized)
    }

    /// Apply `key=value` overrides from a URL query string (leading `?` allowed)
    pub fn apply_query(&mut self, query: &str) {
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let applied = match key {
                "shuffles" => value.parse().map(|v| self.base_shuffle_count = v).is_ok(),
                "step_ms" => value.parse().map(|v| self.shuffle_step_ms = v).is_ok(),
                "reveal_ms" => value.parse().map(|v| self.reveal_delay_ms = v).is_ok(),
                "wrong_ms" => value.parse().map(|v| self.wrong_guess_reveal_ms = v).is_ok(),
                "cups" => value.parse().map(|v| self.base_cups = v).is_ok(),
                "max_cups" => value.parse().map(|v| self.max_cups = v).is_ok(),
                _ => {
                    log::warn!("Unknown tuning key '{}'", key);
                    continue;
                }
            };
            if !applied {
                log::warn!("Bad value '{}' for tuning key '{}'", value, key);
            }
        }
        *self = self.clone().sanitized();
    }

    /// Clamp values the engine cannot run with
    pub fn sanitized(mut self) -> Self {
        // Distinct-slot sampling needs at least two cups
        if self.base_cups < 2 {
            log::warn!("base_cups {} too small, using 2", self.base_cups);
            self.base_cups = 2;
        }
        if self.streak_per_extra_cup == 0 {
            log::warn!("streak_per_extra_cup must be positive, using 1");
            self.streak_per_extra_cup = 1;
        }
        if self.base_cups > CUP_CEILING {
            log::warn!("base_cups {} too large, using {}", self.base_cups, CUP_CEILING);
            self.base_cups = CUP_CEILING;
        }
        if self.max_cups > CUP_CEILING {
            log::warn!("max_cups {} too large, using {}", self.max_cups, CUP_CEILING);
            self.max_cups = CUP_CEILING;
        }
        if self.max_cups < self.base_cups {
            log::warn!(
                "max_cups {} below base_cups {}, raising",
                self.max_cups,
                self.base_cups
            );
            self.max_cups = self.base_cups;
        }
        self
    }

    /// Cups in a round started at this streak, always within `2..=CUP_CEILING`
    pub fn cup_count(&self, streak: u32) -> usize {
        let extra = (streak / self.streak_per_extra_cup.max(1)) as usize;
        self.base_cups
            .saturating_add(extra)
            .min(self.max_cups)
            .clamp(2, CUP_CEILING)
    }

    /// Swap steps in a round started at this streak
    pub fn shuffle_count(&self, streak: u32) -> u32 {
        self.base_shuffle_count.saturating_add(streak)
    }
}
