//! Shell Game - find the ball under the cups
//!
//! Core modules:
//! - `sim`: Deterministic round engine (phases, shuffles, guesses, streak)
//! - `tuning`: Data-driven pacing and difficulty constants
//!
//! Rendering is left to whatever collaborator consumes [`sim::Snapshot`]s;
//! the browser one lives in `main.rs`.

pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Swaps performed in a round at streak 0
    pub const BASE_SHUFFLE_COUNT: u32 = 5;
    /// Delay before each swap, and after the last one (ms)
    pub const SHUFFLE_STEP_MS: u32 = 500;
    /// How long the ball is shown before shuffling begins (ms)
    pub const REVEAL_DELAY_MS: u32 = 1500;
    /// Delay before the real winner is shown after a wrong guess (ms)
    pub const WRONG_GUESS_REVEAL_MS: u32 = 1000;

    /// Cups on the table at streak 0
    pub const BASE_CUPS: usize = 3;
    /// Streak needed for each extra cup
    pub const STREAK_PER_EXTRA_CUP: u32 = 5;
    /// Default upper bound on cups per round (layout runs out of room past this)
    pub const MAX_CUPS: usize = 10;
    /// Most cups any tuning may ask for
    pub const CUP_CEILING: usize = 32;
}
