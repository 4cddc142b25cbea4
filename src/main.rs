//! Wedding Arcade entry point
//!
//! In the browser this wires the engine to animation frames, a wall-clock
//! interval, the keyboard and the HUD. Natively it runs a headless bot demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, KeyboardEvent};

    use wedding_arcade::consts::WALL_TICK_MS;
    use wedding_arcade::engine::{InputEvent, RenderSink};
    use wedding_arcade::platform::session_seed;
    use wedding_arcade::platform::web::{FrameLoop, Interval};
    use wedding_arcade::sim::{AchievementEvent, AudioCue, GamePhase, Generation};
    use wedding_arcade::{Engine, HighScores, Snapshot, Tuning, Variant};

    /// Text fields of the overlay HUD
    struct Hud {
        score: Option<Element>,
        time: Option<Element>,
        phase: Option<Element>,
    }

    impl Hud {
        fn new(document: &web_sys::Document) -> Self {
            Self {
                score: document.get_element_by_id("hud-score"),
                time: document.get_element_by_id("hud-time"),
                phase: document.get_element_by_id("hud-phase"),
            }
        }
    }

    impl RenderSink for Hud {
        fn draw(&mut self, snapshot: &Snapshot<'_>) {
            if let Some(el) = &self.score {
                el.set_text_content(Some(&snapshot.score.to_string()));
            }
            if let Some(el) = &self.time {
                let secs = snapshot.elapsed_play_time_ms / 1000;
                el.set_text_content(Some(&format!("{}:{:02}", secs / 60, secs % 60)));
            }
            if let Some(el) = &self.phase {
                let label = match snapshot.phase {
                    GamePhase::Start => "Press Enter to start",
                    GamePhase::Playing => "",
                    GamePhase::GameOver => "Game over! Press Enter to retry",
                    GamePhase::Clear => "Cleared! Press Enter to play again",
                };
                el.set_text_content(Some(label));
            }
        }
    }

    /// Game view: the engine plus the browser timers it asked for
    struct Game {
        engine: Engine,
        hud: Hud,
        frames: Option<FrameLoop>,
        wall: Option<(Generation, Interval)>,
    }

    impl Game {
        fn redraw(&mut self) {
            self.engine.render(&mut self.hud);
        }

        /// Bring the held timers in line with what the engine wants
        fn reconcile(&mut self, handle: &Weak<RefCell<Game>>) {
            let schedule = self.engine.schedule();

            if schedule.frame_loop {
                if let Some(frames) = &self.frames {
                    frames.start();
                }
            }

            match (schedule.wall_clock, self.wall.as_ref().map(|(g, _)| *g)) {
                (Some(wanted), Some(held)) if wanted == held => {}
                (Some(wanted), _) => {
                    self.wall = None;
                    let handle = handle.clone();
                    let interval = Interval::new(WALL_TICK_MS, move || {
                        if let Some(game) = handle.upgrade() {
                            let mut g = game.borrow_mut();
                            if g.engine.on_wall_tick(wanted) {
                                g.redraw();
                            }
                        }
                    });
                    match interval {
                        Ok(interval) => self.wall = Some((wanted, interval)),
                        Err(e) => log::error!("setInterval failed: {:?}", e),
                    }
                }
                (None, Some(_)) => self.wall = None,
                (None, None) => {}
            }
        }

        /// Escape: stop everything; the view is gone
        fn close(&mut self) {
            self.engine.close();
            self.wall = None;
            self.frames = None;
        }
    }

    fn variant_from_query(window: &web_sys::Window) -> Variant {
        window
            .location()
            .search()
            .ok()
            .and_then(|search| {
                search
                    .trim_start_matches('?')
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("game="))
                    .and_then(|name| name.parse::<Variant>().ok())
            })
            .unwrap_or_default()
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"logger already initialized".into());
        }

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let variant = variant_from_query(&window);
        let seed = session_seed();
        log::info!("Wedding Arcade starting {} with seed {}", variant.as_str(), seed);

        let engine = Engine::new(Tuning::load(variant), seed)
            .with_reporter(HighScores::load())
            .with_audio(|cue: AudioCue| log::debug!("audio cue {:?}", cue))
            .with_achievements(|kind: AchievementEvent, value: u32| {
                log::info!("achievement {:?} ({})", kind, value)
            });

        let game = Rc::new(RefCell::new(Game {
            engine,
            hud: Hud::new(&document),
            frames: None,
            wall: None,
        }));

        let handle = Rc::downgrade(&game);
        let frames = {
            let handle = handle.clone();
            FrameLoop::new(move |time: f64| {
                let Some(game) = handle.upgrade() else {
                    return false;
                };
                let mut g = game.borrow_mut();
                let schedule = g.engine.on_frame(time);
                g.redraw();
                g.reconcile(&handle);
                schedule.frame_loop
            })
        };
        game.borrow_mut().frames = Some(frames);
        game.borrow_mut().redraw();

        setup_keyboard(&window, game)?;

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        log::info!("Wedding Arcade ready");
        Ok(())
    }

    fn setup_keyboard(window: &web_sys::Window, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let handle = Rc::downgrade(&game);
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut g = game.borrow_mut();
            let playing = g.engine.phase() == GamePhase::Playing;
            let input = match event.key().as_str() {
                "Enter" => Some(InputEvent::Start),
                " " | "ArrowUp" if playing => Some(InputEvent::Jump),
                " " | "ArrowUp" => Some(InputEvent::Start),
                "ArrowLeft" => Some(InputEvent::MoveLeft),
                "ArrowRight" => Some(InputEvent::MoveRight),
                "Escape" => {
                    g.close();
                    None
                }
                _ => return,
            };
            event.prevent_default();

            if let Some(input) = input {
                if g.engine.handle_input(input) {
                    g.redraw();
                    g.reconcile(&handle);
                }
            }
        });
        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        // The listener lives as long as the page
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Wedding Arcade failed to start: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: a bot plays a few sessions on a simulated 60 Hz clock
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wedding_arcade::consts::FRAME_BUDGET_MS;
    use wedding_arcade::engine::{InputEvent, ScoreReporter};
    use wedding_arcade::sim::{AchievementEvent, GamePhase, SessionReport};
    use wedding_arcade::{Engine, HighScores, Tuning, Variant, platform};

    /// Frames per simulated wall-clock second
    const FRAMES_PER_SECOND: u64 = 60;
    /// The bot gives up after two minutes so endless sessions still end
    const BOT_PATIENCE_FRAMES: u64 = 120 * FRAMES_PER_SECOND;
    const SESSIONS: u32 = 3;

    env_logger::init();

    let variant = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<Variant>().ok())
        .unwrap_or_default();
    let seed = platform::session_seed();
    log::info!("Wedding Arcade (native) playing {} with seed {}", variant.as_str(), seed);

    let scores = Rc::new(RefCell::new(HighScores::new()));
    let board = Rc::clone(&scores);
    let mut engine = Engine::new(Tuning::for_variant(variant), seed)
        .with_reporter(move |report: &SessionReport| board.borrow_mut().report(report))
        .with_achievements(|kind: AchievementEvent, value: u32| {
            log::info!("achievement {:?} ({})", kind, value)
        });

    let mut now = 0.0;
    for _ in 0..SESSIONS {
        engine.handle_input(InputEvent::Start);

        let mut frames = 0u64;
        while engine.phase() == GamePhase::Playing {
            if frames < BOT_PATIENCE_FRAMES {
                if let Some(input) = bot::decide(&engine) {
                    engine.handle_input(input);
                }
            }
            now += FRAME_BUDGET_MS;
            let schedule = engine.on_frame(now);
            frames += 1;
            if frames % FRAMES_PER_SECOND == 0 {
                if let Some(generation) = schedule.wall_clock {
                    engine.on_wall_tick(generation);
                }
            }
        }

        // Let the confetti settle before the next session
        while engine.schedule().frame_loop {
            now += FRAME_BUDGET_MS;
            engine.on_frame(now);
        }
    }

    let scores = scores.borrow();
    for (rank, entry) in scores.entries(variant).iter().enumerate() {
        log::info!(
            "#{} score {} in {}s{}",
            rank + 1,
            entry.score,
            entry.elapsed_ms / 1000,
            if entry.cleared { " (cleared)" } else { "" }
        );
    }
    println!(
        "{}: best {} over {} sessions",
        variant.as_str(),
        scores.top_score(variant).unwrap_or(0),
        SESSIONS
    );
}

#[cfg(not(target_arch = "wasm32"))]
mod bot {
    use wedding_arcade::Engine;
    use wedding_arcade::engine::InputEvent;
    use wedding_arcade::sim::{Entity, GameState};
    use wedding_arcade::tuning::Variant;

    /// Ticks of warning the runner bot wants before a hazard reaches it
    const JUMP_LEAD_TICKS: f32 = 8.0;
    /// How far above the catcher the bot looks for falling hazards
    const DODGE_RANGE: f32 = 260.0;

    pub fn decide(engine: &Engine) -> Option<InputEvent> {
        let state = engine.state();
        match state.variant() {
            Variant::Runner => runner(state),
            Variant::Catcher => catcher(state),
        }
    }

    fn runner(state: &GameState) -> Option<InputEvent> {
        if !state.player.grounded {
            return None;
        }
        let margin = state.tuning.hitbox_margin;
        let player_right = state.player.bounds().shrink(margin).right();
        let lead = state.speed * JUMP_LEAD_TICKS;
        let threatened = state
            .entities
            .iter()
            .filter(|e| e.is_hazard())
            .any(|e| {
                let gap = e.bounds().shrink(margin).x - player_right;
                (0.0..=lead).contains(&gap)
            });
        threatened.then_some(InputEvent::Jump)
    }

    fn lane_threatened(state: &GameState, lane: u8) -> bool {
        let top = state.player.pos.y;
        state.entities.iter().any(|e: &Entity| {
            e.is_hazard()
                && !e.consumed
                && e.lane == Some(lane)
                && e.bounds().bottom() > top - DODGE_RANGE
                && e.pos.y < top + state.player.size.y
        })
    }

    fn catcher(state: &GameState) -> Option<InputEvent> {
        let lanes = state.tuning.lanes;
        let lane = state.player.lane;

        if lane_threatened(state, lane) {
            if lane > 0 && !lane_threatened(state, lane - 1) {
                return Some(InputEvent::MoveLeft);
            }
            if lane + 1 < lanes && !lane_threatened(state, lane + 1) {
                return Some(InputEvent::MoveRight);
            }
            return None;
        }

        // Chase the lowest collectible whose lane is safe
        let target = state
            .entities
            .iter()
            .filter(|e| !e.is_hazard() && !e.consumed)
            .filter_map(|e| e.lane.map(|l| (l, e.pos.y)))
            .filter(|(l, _)| !lane_threatened(state, *l))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(l, _)| l)?;

        if target < lane && !lane_threatened(state, lane - 1) {
            Some(InputEvent::MoveLeft)
        } else if target > lane && !lane_threatened(state, lane + 1) {
            Some(InputEvent::MoveRight)
        } else {
            None
        }
    }
}
