//! Beat Racer entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlInputElement, KeyboardEvent, MouseEvent};

    use beat_racer::audio::AudioManager;
    use beat_racer::commentary::{CommentaryScheduler, NewsHeadline};
    use beat_racer::sim::{self, GameEvent, RacePhase, RaceState};
    use beat_racer::{HighScores, Settings};

    /// Keys for lanes 0..4
    const LANE_KEYS: [&str; 4] = ["d", "f", "j", "k"];

    /// Game instance holding all state
    struct Game {
        state: RaceState,
        commentary: CommentaryScheduler,
        audio: AudioManager,
        settings: Settings,
        highscores: HighScores,
        last_time: f64,
        /// Accumulates frame time to drive the one-second tick
        second_acc: f32,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            Self {
                state: RaceState::new(seed),
                commentary: CommentaryScheduler::new(seed ^ 0x5eed),
                audio: AudioManager::new(),
                settings: Settings::load(),
                highscores: HighScores::load(),
                last_time: 0.0,
                second_acc: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run one frame of simulation and dispatch events
        fn update(&mut self, dt: f32, time: f64) {
            sim::tick(&mut self.state, dt);
            self.state.particles.truncate(self.settings.max_particles());

            self.second_acc += dt.min(0.1);
            while self.second_acc >= 1.0 {
                self.second_acc -= 1.0;
                sim::second_tick(&mut self.state);
                self.poll_commentary(time);
            }

            for event in self.state.drain_events() {
                self.handle_event(event, time);
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 {
                let elapsed = time - oldest;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        fn poll_commentary(&mut self, time: f64) {
            if !self.settings.commentary_enabled || !self.state.is_racing() {
                return;
            }
            let request = self.commentary.on_second_tick(
                time / 1000.0,
                self.state.race_id,
                self.state.player_score,
                self.state.ai_score,
            );
            if let Some(req) = request {
                publish_commentary_request(&req);
            }
        }

        fn handle_event(&mut self, event: GameEvent, time: f64) {
            match event {
                GameEvent::PlayEffect(kind) => self.audio.play(kind),
                GameEvent::PreloadRequested => {
                    // Audio is procedural and the track is generated; nothing
                    // heavy to fetch, so report readiness right away
                    self.audio.resume();
                    self.state.notify_loading_ready();
                }
                GameEvent::HeadlineRequested => {
                    // External glue may overwrite this with a live fetch
                    show_headline(&NewsHeadline::fallback());
                }
                GameEvent::CountdownStep(step) => {
                    let text = if step == 0 {
                        "GO!".to_string()
                    } else {
                        step.to_string()
                    };
                    set_text("countdown", &text);
                }
                GameEvent::RaceStarted => set_text("countdown", ""),
                GameEvent::RaceFinished(outcome) => {
                    let now = js_sys::Date::now();
                    if let Some(rank) = self.highscores.add_score(
                        &self.state.player_name,
                        self.state.player_score,
                        outcome,
                        now,
                    ) {
                        log::info!("New high score, rank {rank}");
                    }
                    self.highscores.save();
                    if self.settings.commentary_enabled {
                        if let Some(req) = self.commentary.on_race_finished(
                            time / 1000.0,
                            self.state.race_id,
                            self.state.player_score,
                            self.state.ai_score,
                        ) {
                            publish_commentary_request(&req);
                        }
                    }
                }
                GameEvent::NoteHit { .. }
                | GameEvent::NoteMissed { .. }
                | GameEvent::RivalHit { .. } => {}
            }
        }
    }

    /// Hand an outgoing commentary request to the page glue
    fn publish_commentary_request(req: &beat_racer::commentary::CommentaryRequest) {
        if let Ok(json) = serde_json::to_string(req) {
            set_text("commentary-request", &json);
            log::info!("commentary requested: {}", req.context);
        }
    }

    fn show_headline(headline: &NewsHeadline) {
        set_text("news-headline", &headline.text);
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            el.set_text_content(Some(text));
        }
    }

    /// Update HUD elements in DOM from the current snapshot
    fn update_hud(game: &Game) {
        let snapshot = game.state.snapshot();
        set_text("hud-player-score", &snapshot.player_score.to_string());
        set_text("hud-rival-score", &snapshot.ai_score.to_string());
        set_text("hud-timer", &snapshot.time_left.to_string());
        if game.settings.show_fps {
            set_text("hud-fps", &game.fps.to_string());
        }

        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Phase panels
        let panels = [
            ("menu-panel", RacePhase::Menu),
            ("loading-panel", RacePhase::Loading),
            ("results-panel", RacePhase::Finished),
        ];
        for (id, phase) in panels {
            if let Some(el) = document.get_element_by_id(id) {
                let class = if snapshot.phase == phase { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }
        }

        if snapshot.phase == RacePhase::Finished {
            if let Some(result) = snapshot.result {
                set_text("result-text", &format!("{result:?}").to_uppercase());
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Beat Racer starting...");

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());
        setup_buttons(game.clone());
        setup_mute_on_blur(game.clone());
        request_animation_frame(game);

        log::info!("Beat Racer running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Lane key press
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let key = event.key().to_lowercase();
                let mut g = game.borrow_mut();
                if let Some(lane) = LANE_KEYS.iter().position(|k| *k == key) {
                    g.state.set_lane_input(lane, true);
                } else if key == "enter" {
                    match g.state.phase {
                        RacePhase::Menu => {
                            let name = read_name_input();
                            g.audio.resume();
                            g.state.start_race(&name);
                        }
                        RacePhase::Finished => g.state.replay(),
                        _ => {}
                    }
                } else if key == "escape" && g.state.phase == RacePhase::Finished {
                    g.state.exit_to_menu();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Lane key release
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key().to_lowercase();
                if let Some(lane) = LANE_KEYS.iter().position(|k| *k == key) {
                    game.borrow_mut().state.set_lane_input(lane, false);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn read_name_input() -> String {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("player-name"))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let name = read_name_input();
                let mut g = game.borrow_mut();
                g.audio.resume();
                if !g.state.start_race(&name) {
                    log::warn!("enter a name to race");
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("replay-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().state.replay();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("menu-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().state.exit_to_menu();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_mute_on_blur(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.set_muted(false);
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
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

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            g.last_time = time;

            g.update(dt, time);
            update_hud(&g);
        }

        request_animation_frame(game);
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
    log::info!("Beat Racer (native) starting...");
    log::info!("Native mode runs a headless demo race - build for wasm for the real thing");

    run_demo_race();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless scripted race: a naive autoplayer taps whatever drifts into the
/// hit window. Exercises the whole lifecycle end to end.
#[cfg(not(target_arch = "wasm32"))]
fn run_demo_race() {
    use beat_racer::consts::{HIT_LINE, HIT_WINDOW, LANE_COUNT};
    use beat_racer::sim::{self, GameEvent, RacePhase, RaceState};
    use std::time::{SystemTime, UNIX_EPOCH};

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0xbea7);
    let mut state = RaceState::new(seed);
    state.start_race("Console");
    state.notify_loading_ready();

    let dt = 1.0 / 120.0;
    let mut second_acc = 0.0f32;
    let mut frames = 0u64;

    while state.phase != RacePhase::Finished && frames < 140 * 120 {
        // Tap lanes with a note inside the window
        let mut press = [false; LANE_COUNT];
        for note in &state.notes {
            if (note.position - HIT_LINE).abs() < HIT_WINDOW {
                press[note.lane] = true;
            }
        }
        for (lane, pressed) in press.into_iter().enumerate() {
            state.set_lane_input(lane, pressed);
        }

        sim::tick(&mut state, dt);
        second_acc += dt;
        if second_acc >= 1.0 {
            second_acc -= 1.0;
            sim::second_tick(&mut state);
        }

        for event in state.drain_events() {
            match event {
                GameEvent::CountdownStep(0) => log::info!("GO!"),
                GameEvent::CountdownStep(n) => log::info!("{n}..."),
                GameEvent::RaceFinished(outcome) => log::info!("Finished: {outcome:?}"),
                _ => {}
            }
        }
        frames += 1;
    }

    let snapshot = state.snapshot();
    log::info!(
        "Final score: {} vs rival {} -> {:?}",
        snapshot.player_score,
        snapshot.ai_score,
        snapshot.result
    );
}
