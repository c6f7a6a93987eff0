//! Read-only views handed to the presentation layer

use serde::{Deserialize, Serialize};

use super::state::{GamePhase, GameState, Outcome, RoundId};

/// One cup as the renderer should draw it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CupView {
    /// Position in the row
    pub slot: usize,
    pub id: u32,
    pub has_ball: bool,
    pub lifted: bool,
}

/// Owned copy of everything the renderer needs for a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub round_id: RoundId,
    pub phase: GamePhase,
    /// Cups in slot order
    pub cups: Vec<CupView>,
    pub streak: u32,
    pub best_streak: u32,
    pub outcome: Option<Outcome>,
    pub revealed: Vec<u32>,
    pub can_interact: bool,
}

impl GameState {
    pub fn snapshot(&self) -> Snapshot {
        let cups = self
            .round
            .cups
            .iter()
            .enumerate()
            .map(|(slot, cup)| CupView {
                slot,
                id: cup.id,
                has_ball: cup.has_ball,
                lifted: self.is_lifted(cup),
            })
            .collect();

        Snapshot {
            round_id: self.round.id,
            phase: self.phase,
            cups,
            streak: self.streak,
            best_streak: self.best_streak,
            outcome: self.outcome,
            revealed: self.revealed.clone(),
            can_interact: self.can_interact(),
        }
    }
}

impl Snapshot {
    /// Slot of the cup with this id
    pub fn slot_of(&self, id: u32) -> Option<usize> {
        self.cups.iter().find(|c| c.id == id).map(|c| c.slot)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
