//! Deterministic round engine
//!
//! All game logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod schedule;
pub mod shuffle;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use schedule::{Resume, Timer};
pub use shuffle::{distinct_pair, swap_step};
pub use snapshot::{CupView, Snapshot};
pub use state::{Cup, GameEvent, GamePhase, GameState, Outcome, Round, RoundId};
pub use tick::{TickInput, start_round, submit_guess, tick};
