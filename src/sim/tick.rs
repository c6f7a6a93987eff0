//! Triggers and time stepping
//!
//! Inbound triggers (`start_round`, `submit_guess`) apply immediately; timed
//! phase changes happen in `tick` as pending timers run out.

use rand::Rng;

use super::schedule::{Resume, Timer, next_due};
use super::shuffle::swap_step;
use super::state::{GameEvent, GamePhase, GameState, Outcome, Round};

/// Input triggers for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start (or restart) a round
    pub start: bool,
    /// Cup id the player clicked
    pub guess: Option<u32>,
}

/// Apply inputs, then advance game time by `dt_ms`
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: u32) {
    if input.start {
        start_round(state);
    }
    if let Some(cup_id) = input.guess {
        submit_guess(state, cup_id);
    }

    advance_timers(state, dt_ms);
}

/// Lay out a new round and show the ball. Only valid from Idle or Resolved.
pub fn start_round(state: &mut GameState) -> bool {
    match state.phase {
        GamePhase::Idle | GamePhase::Resolved => {}
        phase => {
            log::debug!("Start ignored during {:?}", phase);
            return false;
        }
    }

    // Bounded to 2..=CUP_CEILING, so it always fits a cup id
    let n = state.tuning.cup_count(state.streak);
    let id = state.next_round_id();
    let ids = u32::try_from(n).unwrap_or(u32::MAX);
    // Only place the winner is ever chosen
    let winning_id = state.rng.random_range(0..ids);

    let mut round = Round::new(id, n, winning_id);
    round.shuffles_remaining = state.tuning.shuffle_count(state.streak);
    log::info!(
        "Round {} started: {} cups, {} swaps, streak {}",
        id.0,
        n,
        round.shuffles_remaining,
        state.streak
    );

    state.round = round;
    state.outcome = None;
    state.revealed.clear();
    state.phase = GamePhase::RevealingBall;
    state.schedule(state.tuning.reveal_delay_ms, Resume::BeginShuffle);
    state.events.push(GameEvent::RoundStarted { round: id, cups: n });
    true
}

/// Evaluate a guess. Returns `None` when the guess is ignored: outside
/// `AwaitingGuess`, or for an id not in the current round.
pub fn submit_guess(state: &mut GameState, cup_id: u32) -> Option<Outcome> {
    if state.phase != GamePhase::AwaitingGuess {
        log::debug!("Guess {} ignored during {:?}", cup_id, state.phase);
        return None;
    }
    let Some(cup) = state.round.cup(cup_id).copied() else {
        log::warn!(
            "Guess for unknown cup {} (round has {})",
            cup_id,
            state.round.len()
        );
        return None;
    };

    state.phase = GamePhase::Resolved;
    state.revealed.clear();
    state.revealed.push(cup.id);

    let outcome = if cup.has_ball {
        state.streak += 1;
        state.best_streak = state.best_streak.max(state.streak);
        Outcome::Correct
    } else {
        state.streak = 0;
        state.schedule(state.tuning.wrong_guess_reveal_ms, Resume::RevealWinner);
        Outcome::Incorrect
    };
    state.outcome = Some(outcome);

    log::info!(
        "Round {} guess {}: {:?}, streak {}",
        state.round.id.0,
        cup_id,
        outcome,
        state.streak
    );
    state.events.push(GameEvent::GuessResolved {
        cup_id,
        outcome,
        streak: state.streak,
    });
    Some(outcome)
}

/// Count timers down, firing each one that expires within `dt_ms` in order
fn advance_timers(state: &mut GameState, dt_ms: u32) {
    let mut budget = dt_ms;
    while let Some(idx) = next_due(&state.timers) {
        let due = state.timers[idx].remaining_ms;
        if due > budget {
            for timer in &mut state.timers {
                timer.remaining_ms -= budget;
            }
            return;
        }

        budget -= due;
        for timer in &mut state.timers {
            timer.remaining_ms -= due;
        }
        let timer = state.timers.remove(idx);
        fire(state, timer);
    }
}

fn fire(state: &mut GameState, timer: Timer) {
    if !timer.is_live(state.round.id) {
        log::debug!(
            "Dropping stale {:?} from round {} (now {})",
            timer.resume,
            timer.round.0,
            state.round.id.0
        );
        return;
    }

    match timer.resume {
        Resume::BeginShuffle => {
            state.phase = GamePhase::Shuffling;
            state.events.push(GameEvent::ShuffleStarted);
            schedule_next_swap(state);
        }
        Resume::ShuffleStep => {
            if let Some((a, b)) = swap_step(&mut state.rng, &mut state.round.cups) {
                log::debug!("Swap slots {} <-> {}", a, b);
                state.events.push(GameEvent::CupsSwapped { a, b });
            }
            state.round.shuffles_remaining = state.round.shuffles_remaining.saturating_sub(1);
            schedule_next_swap(state);
        }
        Resume::SettleShuffle => {
            state.phase = GamePhase::AwaitingGuess;
            state.events.push(GameEvent::GuessOpen);
        }
        Resume::RevealWinner => {
            if let Some(winner) = state.round.winning_id() {
                if !state.revealed.contains(&winner) {
                    state.revealed.push(winner);
                }
                state.events.push(GameEvent::WinnerRevealed { cup_id: winner });
            }
        }
    }
}

/// Queue the next swap, or the settle delay once all swaps are done
fn schedule_next_swap(state: &mut GameState) {
    let resume = if state.round.shuffles_remaining > 0 {
        Resume::ShuffleStep
    } else {
        Resume::SettleShuffle
    };
    state.schedule(state.tuning.shuffle_step_ms, resume);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::state::RoundId;
    use proptest::prelude::*;

    const START: TickInput = TickInput {
        start: true,
        guess: None,
    };

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn guess(cup_id: u32) -> TickInput {
        TickInput {
            start: false,
            guess: Some(cup_id),
        }
    }

    /// Tuning with no waits and no swaps, so a round opens for guesses instantly
    fn instant() -> Tuning {
        Tuning {
            base_shuffle_count: 0,
            shuffle_step_ms: 0,
            reveal_delay_ms: 0,
            ..Default::default()
        }
    }

    fn play_to_guess(state: &mut GameState) {
        tick(state, &START, 0);
        tick(state, &idle(), 1_000_000);
        assert_eq!(state.phase, GamePhase::AwaitingGuess);
    }

    fn wrong_id(state: &GameState) -> u32 {
        let winner = state.round.winning_id().unwrap();
        (winner + 1) % state.round.len() as u32
    }

    fn swaps(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::CupsSwapped { .. }))
            .count()
    }

    #[test]
    fn test_first_round_timeline() {
        let mut state = GameState::new(12345, Tuning::default());
        tick(&mut state, &START, 0);
        assert_eq!(state.phase, GamePhase::RevealingBall);
        assert_eq!(state.round.len(), 3);
        assert!(state.round.winning_id().unwrap() < 3);

        tick(&mut state, &idle(), 1499);
        assert_eq!(state.phase, GamePhase::RevealingBall);
        tick(&mut state, &idle(), 1);
        assert_eq!(state.phase, GamePhase::Shuffling);

        // Five swaps at 500ms each, then one more 500ms settle
        tick(&mut state, &idle(), 2500);
        assert_eq!(state.phase, GamePhase::Shuffling);
        assert_eq!(swaps(&state.events), 5);
        tick(&mut state, &idle(), 499);
        assert_eq!(state.phase, GamePhase::Shuffling);
        tick(&mut state, &idle(), 1);
        assert_eq!(state.phase, GamePhase::AwaitingGuess);
        assert_eq!(swaps(&state.events), 5);
        assert!(state.timers.is_empty());
    }

    #[test]
    fn test_large_step_matches_small_steps() {
        let mut coarse = GameState::new(777, Tuning::default());
        let mut fine = GameState::new(777, Tuning::default());
        tick(&mut coarse, &START, 0);
        tick(&mut fine, &START, 0);

        tick(&mut coarse, &idle(), 10_000);
        for _ in 0..625 {
            tick(&mut fine, &idle(), 16);
        }
        assert_eq!(coarse.phase, GamePhase::AwaitingGuess);
        assert_eq!(coarse.round, fine.round);
        assert_eq!(coarse.events, fine.events);
    }

    #[test]
    fn test_cup_count_follows_streak() {
        let mut state = GameState::new(5, Tuning::default());
        state.streak = 4;
        tick(&mut state, &START, 0);
        assert_eq!(state.round.len(), 3);
        assert_eq!(state.round.shuffles_remaining, 9);

        let mut state = GameState::new(5, Tuning::default());
        state.streak = 5;
        tick(&mut state, &START, 0);
        assert_eq!(state.round.len(), 4);
        assert_eq!(state.round.shuffles_remaining, 10);
    }

    #[test]
    fn test_correct_guess() {
        let mut state = GameState::new(42, Tuning::default());
        play_to_guess(&mut state);
        let winner = state.round.winning_id().unwrap();

        assert_eq!(submit_guess(&mut state, winner), Some(Outcome::Correct));
        assert_eq!(state.phase, GamePhase::Resolved);
        assert_eq!(state.streak, 1);
        assert_eq!(state.best_streak, 1);
        assert_eq!(state.revealed, vec![winner]);
        assert!(state.timers.is_empty());
    }

    #[test]
    fn test_incorrect_guess_reveals_winner_later() {
        let mut state = GameState::new(42, Tuning::default());
        state.streak = 3;
        state.best_streak = 3;
        play_to_guess(&mut state);
        let winner = state.round.winning_id().unwrap();
        let other = wrong_id(&state);

        tick(&mut state, &guess(other), 0);
        assert_eq!(state.phase, GamePhase::Resolved);
        assert_eq!(state.outcome, Some(Outcome::Incorrect));
        assert_eq!(state.streak, 0);
        assert_eq!(state.best_streak, 3);
        assert_eq!(state.revealed, vec![other]);

        tick(&mut state, &idle(), 999);
        assert_eq!(state.revealed, vec![other]);
        tick(&mut state, &idle(), 1);
        assert_eq!(state.revealed, vec![other, winner]);
        assert_eq!(
            state.events.last(),
            Some(&GameEvent::WinnerRevealed { cup_id: winner })
        );
    }

    #[test]
    fn test_guess_ignored_when_idle() {
        let mut state = GameState::new(1, Tuning::default());
        assert_eq!(submit_guess(&mut state, 0), None);
        tick(&mut state, &guess(1), 100);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.streak, 0);
        assert_eq!(state.outcome, None);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_guess_ignored_while_shuffling_and_after_resolve() {
        let mut state = GameState::new(3, Tuning::default());
        tick(&mut state, &START, 0);
        let winner = state.round.winning_id().unwrap();
        assert_eq!(submit_guess(&mut state, winner), None);
        tick(&mut state, &idle(), 1600);
        assert_eq!(state.phase, GamePhase::Shuffling);
        assert_eq!(submit_guess(&mut state, winner), None);

        tick(&mut state, &idle(), 10_000);
        assert_eq!(submit_guess(&mut state, winner), Some(Outcome::Correct));
        // Double click
        assert_eq!(submit_guess(&mut state, winner), None);
        assert_eq!(state.streak, 1);
    }

    #[test]
    fn test_unknown_cup_rejected() {
        let mut state = GameState::new(9, Tuning::default());
        play_to_guess(&mut state);
        assert_eq!(submit_guess(&mut state, 3), None);
        assert_eq!(submit_guess(&mut state, u32::MAX), None);
        assert_eq!(state.phase, GamePhase::AwaitingGuess);
        assert_eq!(state.outcome, None);
    }

    #[test]
    fn test_start_ignored_mid_round() {
        let mut state = GameState::new(8, Tuning::default());
        assert!(start_round(&mut state));
        let round = state.round.id;
        assert!(!start_round(&mut state));
        tick(&mut state, &START, 2000);
        assert_eq!(state.round.id, round);
        assert_eq!(state.phase, GamePhase::Shuffling);
    }

    #[test]
    fn test_restart_from_resolved() {
        let mut state = GameState::new(8, Tuning::default());
        play_to_guess(&mut state);
        let first = state.round.id;
        let winner = state.round.winning_id().unwrap();
        submit_guess(&mut state, winner);

        tick(&mut state, &START, 0);
        assert_eq!(state.phase, GamePhase::RevealingBall);
        assert!(state.round.id > first);
        assert_eq!(state.outcome, None);
        assert!(state.revealed.is_empty());
        assert_eq!(state.round.shuffles_remaining, 6);
    }

    #[test]
    fn test_stale_reveal_dropped_after_restart() {
        let mut state = GameState::new(31, instant());
        play_to_guess(&mut state);
        let old_round = state.round.id;
        let miss = wrong_id(&state);
        tick(&mut state, &guess(miss), 0);

        // Restart before the old reveal fires; the new round opens instantly
        tick(&mut state, &START, 400);
        assert_eq!(state.phase, GamePhase::AwaitingGuess);
        assert!(state.timers.iter().any(|t| t.round == old_round));

        let miss = wrong_id(&state);
        let winner = state.round.winning_id().unwrap();
        tick(&mut state, &guess(miss), 0);

        // Old timer expires here and must not touch the new round
        tick(&mut state, &idle(), 600);
        assert_eq!(state.revealed, vec![miss]);
        assert!(state.timers.iter().all(|t| t.round == state.round.id));

        tick(&mut state, &idle(), 400);
        assert_eq!(state.revealed, vec![miss, winner]);
    }

    #[test]
    fn test_stale_timer_never_fires() {
        let mut state = GameState::new(2, Tuning::default());
        state.timers.push(Timer::new(RoundId(999), 0, Resume::SettleShuffle));
        tick(&mut state, &idle(), 10);
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.timers.is_empty());
    }

    #[test]
    fn test_same_seed_same_game() {
        let run = |seed| {
            let mut state = GameState::new(seed, Tuning::default());
            let mut layouts = Vec::new();
            for _ in 0..5 {
                play_to_guess(&mut state);
                layouts.push(state.round.cups.clone());
                let winner = state.round.winning_id().unwrap();
                submit_guess(&mut state, winner);
            }
            (layouts, state.streak)
        };
        assert_eq!(run(4242), run(4242));
        assert_eq!(run(4242).1, 5);
    }

    #[test]
    fn test_streak_grows_table() {
        let mut state = GameState::new(11, instant());
        for expected_streak in 1..=12 {
            play_to_guess(&mut state);
            let winner = state.round.winning_id().unwrap();
            submit_guess(&mut state, winner);
            assert_eq!(state.streak, expected_streak);
        }
        tick(&mut state, &START, 0);
        // 3 + 12 / 5
        assert_eq!(state.round.len(), 5);
    }

    #[test]
    fn test_winner_pick_roughly_uniform() {
        let mut state = GameState::new(2025, Tuning::default());
        let mut counts = [0u32; 3];
        for _ in 0..30_000 {
            assert!(start_round(&mut state));
            counts[state.round.winning_id().unwrap() as usize] += 1;
            state.phase = GamePhase::Idle;
            state.timers.clear();
        }
        for count in counts {
            assert!((9_500..=10_500).contains(&count), "skewed: {:?}", counts);
        }
    }

    proptest! {
        #[test]
        fn prop_engine_round_invariants(seed in any::<u64>(), streak in 0u32..40) {
            let mut state = GameState::new(seed, Tuning::default());
            state.streak = streak;
            play_to_guess(&mut state);

            let n = state.tuning.cup_count(streak);
            prop_assert_eq!(state.round.len(), n);
            prop_assert_eq!(state.round.cups.iter().filter(|c| c.has_ball).count(), 1);
            let mut ids: Vec<u32> = state.round.cups.iter().map(|c| c.id).collect();
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..n as u32).collect::<Vec<_>>());
            prop_assert_eq!(swaps(&state.events), state.tuning.shuffle_count(streak) as usize);
        }

        #[test]
        fn prop_guess_outcomes(seed in any::<u64>(), streak in 0u32..30) {
            let mut state = GameState::new(seed, instant());
            state.streak = streak;
            play_to_guess(&mut state);
            let winner = state.round.winning_id().unwrap();

            for cup_id in 0..state.round.len() as u32 {
                let mut trial = state.clone();
                let outcome = submit_guess(&mut trial, cup_id);
                prop_assert_eq!(trial.phase, GamePhase::Resolved);
                prop_assert_eq!(&trial.revealed, &vec![cup_id]);
                if cup_id == winner {
                    prop_assert_eq!(outcome, Some(Outcome::Correct));
                    prop_assert_eq!(trial.streak, streak + 1);
                } else {
                    prop_assert_eq!(outcome, Some(Outcome::Incorrect));
                    prop_assert_eq!(trial.streak, 0);
                }
            }
        }
    }
}
