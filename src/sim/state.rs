//! Game state and core round types
//!
//! Everything the engine owns lives here: the current round, the streak,
//! pending timers and the seeded RNG. The presentation side only ever sees
//! `Snapshot`s built from this.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::schedule::{Resume, Timer};
use crate::tuning::Tuning;

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, no round in play
    Idle,
    /// Winning cup lifted so the player can see the ball
    RevealingBall,
    /// Cups are being swapped
    Shuffling,
    /// Player may pick a cup
    AwaitingGuess,
    /// Guess made, result showing
    Resolved,
}

/// Result of a guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Identity of a round, used to tag timers scheduled on its behalf
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct RoundId(pub u64);

/// A cup. Identity and ball are fixed for the life of the round;
/// shuffling only moves cups between slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cup {
    pub id: u32,
    pub has_ball: bool,
}

/// One round: cups in slot order plus the swaps still to come
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    /// Index is the slot, value is whichever cup sits there
    pub cups: Vec<Cup>,
    /// Swap steps left in the shuffle phase
    pub shuffles_remaining: u32,
}

impl Round {
    /// Build cups `0..n` with the ball under `winning_id`
    pub fn new(id: RoundId, n: usize, winning_id: u32) -> Self {
        let cups = (0..n)
            .map_while(|slot| u32::try_from(slot).ok())
            .map(|cup_id| Cup {
                id: cup_id,
                has_ball: cup_id == winning_id,
            })
            .collect();
        Self {
            id,
            cups,
            shuffles_remaining: 0,
        }
    }

    /// Number of cups (and slots) in the round
    pub fn len(&self) -> usize {
        self.cups.len()
    }

    /// True only for a round built with no cups
    pub fn is_empty(&self) -> bool {
        self.cups.is_empty()
    }

    /// Look up a cup by id (not by slot)
    pub fn cup(&self, id: u32) -> Option<&Cup> {
        self.cups.iter().find(|c| c.id == id)
    }

    /// Slot currently holding the cup with this id
    pub fn slot_of(&self, id: u32) -> Option<usize> {
        self.cups.iter().position(|c| c.id == id)
    }

    /// Id of the cup hiding the ball
    pub fn winning_id(&self) -> Option<u32> {
        self.cups.iter().find(|c| c.has_ball).map(|c| c.id)
    }
}

/// Events emitted for the presentation layer (drained each frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// New round laid out, ball visible
    RoundStarted { round: RoundId, cups: usize },
    /// Ball hidden, swapping begins
    ShuffleStarted,
    /// Cups in slots `a` and `b` traded places
    CupsSwapped { a: usize, b: usize },
    /// Guesses are now accepted
    GuessOpen,
    /// Player picked `cup_id`
    GuessResolved {
        cup_id: u32,
        outcome: Outcome,
        streak: u32,
    },
    /// Real winner shown after a miss
    WinnerRevealed { cup_id: u32 },
}

/// Complete engine state (deterministic for a given seed and input stream)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Pacing and difficulty knobs
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Current round (a placeholder row while idle)
    pub round: Round,
    /// Consecutive correct guesses
    pub streak: u32,
    /// Best streak this session
    pub best_streak: u32,
    /// Result of the last guess in this round
    pub outcome: Option<Outcome>,
    /// Cup ids currently shown lifted in the Resolved phase
    pub revealed: Vec<u32>,
    /// Pending timed resumptions
    pub timers: Vec<Timer>,
    /// Events not yet picked up by the presentation layer
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_round: u64,
}

impl GameState {
    /// Create an idle game with the given seed
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let tuning = tuning.sanitized();
        // Something to draw on the start screen: ball under the middle cup
        let middle = u32::try_from(tuning.base_cups / 2).unwrap_or(0);
        let placeholder = Round::new(RoundId(0), tuning.base_cups, middle);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            phase: GamePhase::Idle,
            round: placeholder,
            streak: 0,
            best_streak: 0,
            outcome: None,
            revealed: Vec::new(),
            timers: Vec::new(),
            events: Vec::new(),
            next_round: 1,
        }
    }

    /// Allocate a fresh round id
    pub fn next_round_id(&mut self) -> RoundId {
        let id = RoundId(self.next_round);
        self.next_round += 1;
        id
    }

    /// Schedule a resumption on behalf of the current round
    pub fn schedule(&mut self, delay_ms: u32, resume: Resume) {
        self.timers.push(Timer::new(self.round.id, delay_ms, resume));
    }

    /// Whether a cup should currently be drawn lifted
    pub fn is_lifted(&self, cup: &Cup) -> bool {
        match self.phase {
            GamePhase::RevealingBall => cup.has_ball,
            GamePhase::Resolved => self.revealed.contains(&cup.id),
            _ => false,
        }
    }

    /// Whether cup clicks are accepted right now
    pub fn can_interact(&self) -> bool {
        self.phase == GamePhase::AwaitingGuess
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
