//! Shell Game entry point
//!
//! Handles platform-specific initialization and runs the game loop. On the
//! web the DOM is the renderer; natively a scripted player runs a few rounds.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, MouseEvent};

    use shell_game::Tuning;
    use shell_game::sim::{GameEvent, GamePhase, GameState, Outcome, Snapshot, TickInput, tick};

    /// Horizontal distance between cup slots (px)
    const SLOT_WIDTH: f64 = 120.0;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        last_time: f64,
        input: TickInput,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning) -> Self {
            Self {
                state: GameState::new(seed, tuning),
                last_time: 0.0,
                input: TickInput::default(),
            }
        }

        /// Feed pending clicks to the engine and advance its clock
        fn update(&mut self, dt_ms: u32) {
            let input = std::mem::take(&mut self.input);
            tick(&mut self.state, &input, dt_ms);
        }

        /// Sync the DOM with the current snapshot
        fn render(&mut self, document: &Document) {
            for event in self.state.drain_events() {
                log::debug!("{:?}", event);
                if let GameEvent::RoundStarted { cups, .. } = event {
                    build_cups(document, cups);
                }
            }

            let snap = self.state.snapshot();
            draw_cups(document, &snap);
            update_hud(document, &snap);
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Shell Game starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let mut tuning = Tuning::default();
        if let Ok(query) = window.location().search() {
            tuning.apply_query(&query);
        }

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, tuning)));
        log::info!("Game initialized with seed: {}", seed);

        build_cups(&document, game.borrow().state.round.len());
        setup_start_button(&document, game.clone());
        setup_table_clicks(&document, game.clone());

        request_animation_frame(game);

        log::info!("Shell Game running!");
    }

    /// Recreate one element per cup, keyed by cup id
    fn build_cups(document: &Document, count: usize) {
        let Some(table) = document.get_element_by_id("table") else {
            log::warn!("No #table element");
            return;
        };
        table.set_inner_html("");
        for id in 0..count {
            let Ok(cup) = document.create_element("button") else {
                continue;
            };
            let _ = cup.set_attribute("class", "cup");
            let _ = cup.set_attribute("data-cup-id", &id.to_string());
            let _ = table.append_child(&cup);
        }
    }

    fn cup_element(document: &Document, id: u32) -> Option<Element> {
        document
            .query_selector(&format!("[data-cup-id=\"{}\"]", id))
            .ok()
            .flatten()
    }

    /// Position cups by slot and toggle lifted/ball classes
    fn draw_cups(document: &Document, snap: &Snapshot) {
        let center = (snap.cups.len() as f64 - 1.0) / 2.0;
        for cup in &snap.cups {
            let Some(el) = cup_element(document, cup.id) else {
                continue;
            };
            let x = (cup.slot as f64 - center) * SLOT_WIDTH;
            let _ = el.set_attribute("style", &format!("transform: translateX({}px)", x));
            let classes = el.class_list();
            let _ = classes.toggle_with_force("lifted", cup.lifted);
            let _ = classes.toggle_with_force("has-ball", cup.has_ball);
            let _ = classes.toggle_with_force("interactive", snap.can_interact);
        }
    }

    /// Update HUD elements in DOM
    fn update_hud(document: &Document, snap: &Snapshot) {
        if let Some(el) = document.query_selector("#hud-streak .hud-value").ok().flatten() {
            el.set_text_content(Some(&snap.streak.to_string()));
        }
        if let Some(el) = document.query_selector("#hud-best .hud-value").ok().flatten() {
            el.set_text_content(Some(&snap.best_streak.to_string()));
        }

        // Styling picks the message from these attributes
        if let Some(el) = document.get_element_by_id("game") {
            let phase = match snap.phase {
                GamePhase::Idle => "idle",
                GamePhase::RevealingBall => "revealing",
                GamePhase::Shuffling => "shuffling",
                GamePhase::AwaitingGuess => "guessing",
                GamePhase::Resolved => "resolved",
            };
            let outcome = match snap.outcome {
                Some(Outcome::Correct) => "correct",
                Some(Outcome::Incorrect) => "incorrect",
                None => "none",
            };
            let _ = el.set_attribute("data-phase", phase);
            let _ = el.set_attribute("data-outcome", outcome);
        }

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let show = matches!(snap.phase, GamePhase::Idle | GamePhase::Resolved);
            let _ = btn.class_list().toggle_with_force("hidden", !show);
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Clamp long gaps (background tab) to a quarter second
            let dt_ms = if g.last_time > 0.0 {
                (time - g.last_time).clamp(0.0, 250.0) as u32
            } else {
                0
            };
            g.last_time = time;

            g.update(dt_ms);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.render(&document);
            }
        }

        request_animation_frame(game);
    }

    fn setup_start_button(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.start = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// One delegated listener on the table; cups are rebuilt every round
    fn setup_table_clicks(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(table) = document.get_element_by_id("table") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let cup_id = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest(".cup").ok().flatten())
                    .and_then(|el| el.get_attribute("data-cup-id"))
                    .and_then(|id| id.parse::<u32>().ok());
                if let Some(cup_id) = cup_id {
                    game.borrow_mut().input.guess = Some(cup_id);
                }
            });
            let _ =
                table.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Shell Game (native) starting...");
    log::info!("Native mode is a headless demo - use `trunk serve` for the web version");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rand::random::<u64>);
    let mut tuning = shell_game::Tuning::default();
    if let Some(query) = args.next() {
        tuning.apply_query(&query);
    }

    headless::run(seed, tuning, 20);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use shell_game::Tuning;
    use shell_game::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

    /// Simulated frame length (ms)
    const FRAME_MS: u32 = 16;
    /// Chance the scripted player keeps track of the ball
    const PLAYER_ACCURACY: f64 = 0.85;

    /// Play up to `rounds` rounds with a scripted player, logging events
    pub fn run(seed: u64, tuning: Tuning, rounds: u32) {
        log::info!("Headless game with seed: {}", seed);
        let mut state = GameState::new(seed, tuning);
        let mut player = Pcg32::seed_from_u64(seed ^ 0x5DEE_CE66);
        let mut played = 0;

        while played < rounds {
            let mut input = TickInput::default();
            match state.phase {
                GamePhase::Idle => input.start = true,
                GamePhase::AwaitingGuess => {
                    input.guess = pick_cup(&state, &mut player);
                    played += 1;
                }
                // Wait for the late winner reveal before moving on
                GamePhase::Resolved if state.timers.is_empty() => input.start = true,
                _ => {}
            }
            tick(&mut state, &input, FRAME_MS);

            for event in state.drain_events() {
                match event {
                    GameEvent::CupsSwapped { a, b } => log::debug!("swap {} <-> {}", a, b),
                    other => log::info!("{:?}", other),
                }
            }
        }

        println!(
            "Played {} rounds: streak {}, best {}",
            played, state.streak, state.best_streak
        );
    }

    fn pick_cup(state: &GameState, player: &mut Pcg32) -> Option<u32> {
        let n = state.round.len() as u32;
        if player.random_bool(PLAYER_ACCURACY) {
            state.round.winning_id()
        } else {
            Some(player.random_range(0..n))
        }
    }
}
