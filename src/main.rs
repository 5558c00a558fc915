//! Crab Spotter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement, Window};

    use crab_spotter::consts::MAX_FRAME_DT;
    use crab_spotter::sim::{
        self, Arena, Crab, CrabId, GameEvent, GameState, HoverState, RoundFeedback, RoundToken,
        ScoreTone, Scoreboard, SessionSummary, SessionToken,
    };
    use crab_spotter::{Presenter, Settings, present, sync_transforms};

    const CLOCK_INTERVAL_MS: i32 = 1000;
    const POP_MS: i32 = 300;
    const TONE_CLASSES: [&str; 3] = ["text-green-400", "text-red-400", "text-yellow-300"];

    fn window() -> Result<Window, JsValue> {
        web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
    }

    fn element_by_id(document: &Document, id: &str) -> Result<Element, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))
    }

    fn html_element_by_id(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
        element_by_id(document, id)?
            .dyn_into::<HtmlElement>()
            .map_err(JsValue::from)
    }

    fn transform(pos: Vec2, scale: f32) -> String {
        format!("translate({}px, {}px) scale({})", pos.x, pos.y, scale)
    }

    /// Briefly enlarge an element, then settle back
    fn pop(el: &HtmlElement, transform: &str) {
        let style = el.style();
        let _ = style.set_property("transition", "transform 0.3s ease-out");
        let _ = style.set_property("transform", transform);

        let el = el.clone();
        let reset = Closure::once_into_js(move || {
            let _ = el.style().set_property("transform", "scale(1) rotate(0deg)");
        });
        if let Ok(window) = window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                reset.unchecked_ref(),
                POP_MS,
            );
        }
    }

    /// Renders the game into the page's DOM
    struct DomPresenter {
        document: Document,
        game_area: Element,
        score: HtmlElement,
        timer: HtmlElement,
        round: HtmlElement,
        instructions: Element,
        start_btn: HtmlButtonElement,
        /// Indexed by ID; display order is random
        crab_els: HashMap<CrabId, HtmlElement>,
        last_board: Option<Scoreboard>,
    }

    impl DomPresenter {
        fn new(document: &Document) -> Result<Self, JsValue> {
            Ok(Self {
                document: document.clone(),
                game_area: element_by_id(document, "game-area")?,
                score: html_element_by_id(document, "score-display")?,
                timer: html_element_by_id(document, "timer-display")?,
                round: html_element_by_id(document, "round-display")?,
                instructions: element_by_id(document, "instructions")?,
                start_btn: element_by_id(document, "start-restart-btn")?
                    .dyn_into::<HtmlButtonElement>()
                    .map_err(JsValue::from)?,
                crab_els: HashMap::new(),
                last_board: None,
            })
        }

        /// Current arena size from layout
        fn arena(&self) -> Arena {
            let rect = self.game_area.get_bounding_client_rect();
            let viewport = window()
                .ok()
                .and_then(|w| w.inner_width().ok())
                .and_then(|v| v.as_f64())
                .unwrap_or(rect.width());
            Arena::new(rect.width() as f32, rect.height() as f32).with_viewport(viewport as f32)
        }

        fn show_playing(&self) {
            let _ = self.instructions.class_list().add_1("hidden");
            self.start_btn.set_disabled(true);
            self.start_btn.set_text_content(Some("Game In Progress..."));
            let classes = self.start_btn.class_list();
            for class in ["bg-green-500", "hover:bg-green-600", "bg-teal-600", "hover:bg-teal-700"] {
                let _ = classes.remove_1(class);
            }
            let _ = classes.add_1("bg-gray-500");
        }

        fn clear_crabs(&mut self) {
            if let Ok(nodes) = self.game_area.query_selector_all(".crab-image") {
                for i in 0..nodes.length() {
                    if let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                        el.remove();
                    }
                }
            }
            self.crab_els.clear();
        }

        fn create_crab_element(&self, crab: &Crab) -> Result<HtmlElement, JsValue> {
            let el = self
                .document
                .create_element("img")?
                .dyn_into::<HtmlElement>()
                .map_err(JsValue::from)?;
            el.set_class_name(if crab.is_target {
                "crab-image egc-target"
            } else {
                "crab-image"
            });
            el.set_attribute("src", crab.species.image_url)?;
            el.set_attribute("alt", crab.species.fallback_text)?;
            el.set_attribute("data-id", &crab.id.to_string())?;
            el.set_attribute("data-fallback", crab.species.fallback_text)?;
            el.set_title(&crab.species.title());

            let style = el.style();
            style.set_property("width", &format!("{}px", crab.size))?;
            style.set_property("height", &format!("{}px", crab.size))?;
            style.set_property("transform", &transform(crab.pos, crab.scale))?;
            style.set_property("transition", "transform 0.1s ease-in-out, z-index 0.1s")?;

            self.game_area.append_child(&el)?;
            Ok(el)
        }

        /// Element for a crab; re-queried if the image was swapped for its fallback
        fn crab_element(&mut self, id: CrabId) -> Option<HtmlElement> {
            if let Some(el) = self.crab_els.get(&id) {
                if el.is_connected() {
                    return Some(el.clone());
                }
            }
            let el = self
                .game_area
                .query_selector(&format!("[data-id=\"{}\"]", id))
                .ok()
                .flatten()?
                .dyn_into::<HtmlElement>()
                .ok()?;
            self.crab_els.insert(id, el.clone());
            Some(el)
        }

        fn add_class(&mut self, id: CrabId, class: &str) {
            if let Some(el) = self.crab_element(id) {
                let _ = el.class_list().add_1(class);
            }
        }
    }

    impl Presenter for DomPresenter {
        fn render_crabs(&mut self, crabs: &[Crab]) {
            self.clear_crabs();
            for crab in crabs {
                match self.create_crab_element(crab) {
                    Ok(el) => {
                        self.crab_els.insert(crab.id, el);
                    }
                    Err(e) => log::error!("Failed to create crab {}: {:?}", crab.id, e),
                }
            }
        }

        fn update_crab_transform(&mut self, id: CrabId, pos: Vec2, scale: f32) {
            if let Some(el) = self.crab_element(id) {
                let style = el.style();
                let _ = style.set_property("transform", &transform(pos, scale));
                let _ = style.set_property("z-index", if scale > 1.0 { "10" } else { "1" });
            }
        }

        fn show_feedback(&mut self, feedback: &RoundFeedback) {
            if feedback.correct {
                self.add_class(feedback.clicked, "feedback-win");
            } else {
                self.add_class(feedback.clicked, "feedback-lose");
                self.add_class(feedback.target, "feedback-win");
            }
        }

        fn update_scoreboard(&mut self, board: &Scoreboard) {
            let last = self.last_board.unwrap_or(*board);

            self.score.set_text_content(Some(&board.score.to_string()));
            let classes = self.score.class_list();
            for class in TONE_CLASSES {
                let _ = classes.remove_1(class);
            }
            let tone = match board.tone() {
                ScoreTone::Positive => TONE_CLASSES[0],
                ScoreTone::Negative => TONE_CLASSES[1],
                ScoreTone::Neutral => TONE_CLASSES[2],
            };
            let _ = classes.add_1(tone);

            self.round.set_text_content(Some(&board.rounds.to_string()));
            self.timer.set_text_content(Some(&board.timer_text()));

            if board.score != last.score {
                let tilt = if board.score > last.score { 5 } else { -5 };
                pop(&self.score, &format!("scale(1.25) rotate({}deg)", tilt));
            }
            if board.rounds != last.rounds {
                pop(&self.round, "scale(1.25)");
            }
            if board.timer_urgent() && board.remaining_secs != last.remaining_secs {
                pop(&self.timer, "scale(1.25)");
            }

            self.last_board = Some(*board);
        }

        fn session_ended(&mut self, summary: &SessionSummary) {
            self.clear_crabs();

            let _ = self.instructions.class_list().remove_1("hidden");
            if let Ok(Some(p)) = self.instructions.query_selector("p") {
                p.set_inner_html(&format!(
                    "{}<br>Click 'Play Again!' to restart.",
                    summary
                ));
            }

            self.start_btn.set_disabled(false);
            self.start_btn
                .set_text_content(Some(&summary.restart_label()));
            let classes = self.start_btn.class_list();
            let _ = classes.remove_1("bg-gray-500");
            let _ = classes.add_1("bg-teal-600");
            let _ = classes.add_1("hover:bg-teal-700");
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        presenter: DomPresenter,
        /// Timestamp of the previous animation frame (0 = none yet)
        last_time: f64,
        /// Active countdown interval and its callback
        clock: Option<(i32, Closure<dyn FnMut()>)>,
        /// Interval callback kept alive until it can no longer be running
        retired_clock: Option<Closure<dyn FnMut()>>,
    }

    /// Present drained events and arm whatever timers they ask for
    fn process(game: &Rc<RefCell<Game>>) {
        let (events, settle_ms) = {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            let events = g.state.drain_events();
            present(&mut g.presenter, &g.state, &events);
            (events, g.state.settings.settle_delay_ms)
        };

        for event in events {
            match event {
                GameEvent::SessionStarted(token) => {
                    arm_clock(game, token);
                    request_animation_frame(game.clone(), token);
                }
                GameEvent::ClickResolved { next, .. } => {
                    schedule_next_round(game.clone(), next, settle_ms);
                }
                GameEvent::SessionEnded(_) => disarm_clock(game),
                GameEvent::RoundStarted { .. } | GameEvent::ClockTicked { .. } => {}
            }
        }
    }

    fn arm_clock(game: &Rc<RefCell<Game>>, token: SessionToken) {
        disarm_clock(game);
        game.borrow_mut().retired_clock = None;

        let Ok(window) = window() else {
            return;
        };
        let tick_game = game.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let ticked = sim::clock_tick(&mut tick_game.borrow_mut().state, token);
            if ticked {
                process(&tick_game);
            }
        });
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            CLOCK_INTERVAL_MS,
        ) {
            Ok(id) => game.borrow_mut().clock = Some((id, closure)),
            Err(e) => log::error!("Failed to start clock: {:?}", e),
        }
    }

    fn disarm_clock(game: &Rc<RefCell<Game>>) {
        let mut g = game.borrow_mut();
        if let Some((id, closure)) = g.clock.take() {
            if let Ok(window) = window() {
                window.clear_interval_with_handle(id);
            }
            // May be the callback currently executing; drop it on the next arm
            g.retired_clock = Some(closure);
        }
    }

    fn schedule_next_round(game: Rc<RefCell<Game>>, token: RoundToken, delay_ms: u32) {
        let Ok(window) = window() else {
            return;
        };
        let closure = Closure::once_into_js(move || {
            let advanced = sim::advance_round(&mut game.borrow_mut().state, token);
            if advanced {
                process(&game);
            }
        });
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.unchecked_ref(),
            delay_ms as i32,
        ) {
            log::error!("Failed to schedule next round: {:?}", e);
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, token: SessionToken) {
        let Ok(window) = window() else {
            return;
        };
        let closure = Closure::once_into_js(move |time: f64| {
            game_loop(game, token, time);
        });
        let _ = window.request_animation_frame(closure.unchecked_ref());
    }

    fn game_loop(game: Rc<RefCell<Game>>, token: SessionToken, time: f64) {
        {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            // Loop ends with its session
            if !g.state.is_current_session(token) {
                return;
            }

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            sim::tick(&mut g.state, dt.min(MAX_FRAME_DT));
            sync_transforms(&mut g.presenter, &g.state);
        }

        process(&game);
        request_animation_frame(game, token);
    }

    fn start(game: &Rc<RefCell<Game>>) {
        {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            let arena = g.presenter.arena();
            g.last_time = 0.0;
            g.presenter.show_playing();
            sim::start_session(&mut g.state, arena);
        }
        process(game);
    }

    fn crab_id_from_event(event: &Event) -> Option<CrabId> {
        let target = event.target()?.dyn_into::<Element>().ok()?;
        let el = target.closest("[data-id]").ok()??;
        el.get_attribute("data-id")?.parse().ok().map(CrabId)
    }

    fn setup_start_button(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let btn = element_by_id(document, "start-restart-btn")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
            start(&game);
        });
        btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    /// Delegated pointer handlers: crabs are recreated every round
    fn setup_crab_input(game_area: &Element, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
                if let Some(id) = crab_id_from_event(&event) {
                    let outcome = sim::resolve_click(&mut game.borrow_mut().state, id);
                    log::debug!("Click on {}: {:?}", id, outcome);
                    process(&game);
                }
            });
            game_area.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        for (event_name, hover) in [
            ("mouseover", HoverState::Hovered),
            ("mouseout", HoverState::Idle),
            ("mousedown", HoverState::Pressed),
        ] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
                if let Some(id) = crab_id_from_event(&event) {
                    sim::set_hover(&mut game.borrow_mut().state, id, hover);
                }
            });
            game_area
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Swap a broken crab image for a text element carrying the same ID
    fn replace_with_fallback(document: &Document, img: &Element) -> Result<(), JsValue> {
        let div = document.create_element("div")?;
        div.set_class_name(&format!(
            "{} flex items-center justify-center text-xs",
            img.class_name()
        ));
        for attr in ["data-id", "title", "style"] {
            if let Some(value) = img.get_attribute(attr) {
                div.set_attribute(attr, &value)?;
            }
        }
        let text = img.get_attribute("data-fallback").unwrap_or_default();
        div.set_text_content(Some(&text));
        img.replace_with_with_node_1(&div)?;
        log::warn!("Crab image missing, showing '{}'", text);
        Ok(())
    }

    fn setup_asset_fallback(document: &Document, game_area: &Element) -> Result<(), JsValue> {
        let document = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
            let Some(img) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if !img.tag_name().eq_ignore_ascii_case("img") {
                return;
            }
            if let Err(e) = replace_with_fallback(&document, &img) {
                log::error!("Fallback failed: {:?}", e);
            }
        });
        // `error` does not bubble; listen in the capture phase
        game_area.add_event_listener_with_callback_and_bool(
            "error",
            closure.as_ref().unchecked_ref(),
            true,
        )?;
        closure.forget();
        Ok(())
    }

    fn setup_resize(window: &Window, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            let arena = g.presenter.arena();
            sim::set_arena_bounds(&mut g.state, arena);
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Crab Spotter starting...");

        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let state = GameState::new(seed, settings);

        let mut presenter = DomPresenter::new(&document)?;
        presenter.update_scoreboard(&state.scoreboard());
        let game_area = presenter.game_area.clone();

        let game = Rc::new(RefCell::new(Game {
            state,
            presenter,
            last_time: 0.0,
            clock: None,
            retired_clock: None,
        }));

        setup_start_button(&document, game.clone())?;
        setup_crab_input(&game_area, game.clone())?;
        setup_asset_fallback(&document, &game_area)?;
        setup_resize(&window, game)?;

        log::info!("Crab Spotter ready (seed {})", seed);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        web_sys::console::error_1(&e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use crab_spotter::consts::HEADLESS_FRAME_DT;
    use crab_spotter::sim::{
        self, Arena, Crab, CrabId, GameState, RoundFeedback, Scoreboard, SessionSummary, Timeline,
    };
    use crab_spotter::{Autoplay, Presenter, Settings, present};

    /// Reaction time and accuracy of the demo bot
    const BOT_REACTION_SECS: f64 = 0.8;
    const BOT_ACCURACY: f64 = 0.75;

    /// Presenter that narrates the game through `log`
    #[derive(Default)]
    struct LogPresenter {
        final_summary: Option<SessionSummary>,
    }

    impl Presenter for LogPresenter {
        fn render_crabs(&mut self, crabs: &[Crab]) {
            let names: Vec<&str> = crabs.iter().map(|c| c.species.fallback_text).collect();
            log::info!("Crabs: {}", names.join(", "));
        }

        fn update_crab_transform(&mut self, id: CrabId, pos: Vec2, scale: f32) {
            log::trace!("Crab {} at ({:.1}, {:.1}) x{}", id, pos.x, pos.y, scale);
        }

        fn show_feedback(&mut self, feedback: &RoundFeedback) {
            if feedback.correct {
                log::info!("Spotted the EGC (crab {})", feedback.clicked);
            } else {
                log::info!(
                    "Wrong crab {}; the EGC was crab {}",
                    feedback.clicked,
                    feedback.target
                );
            }
        }

        fn update_scoreboard(&mut self, board: &Scoreboard) {
            log::debug!(
                "Score {} | Round {} | {}",
                board.score,
                board.rounds,
                board.timer_text()
            );
        }

        fn session_ended(&mut self, summary: &SessionSummary) {
            self.final_summary = Some(*summary);
        }
    }

    pub fn run() {
        let seed = std::env::args()
            .nth(1)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(|| {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or_default()
            });
        log::info!("Autoplay session with seed {}", seed);

        let mut state = GameState::new(seed, Settings::load());
        let mut timeline = Timeline::new(HEADLESS_FRAME_DT);
        let mut bot = Autoplay::new(seed.wrapping_add(1), BOT_REACTION_SECS, BOT_ACCURACY);
        let mut presenter = LogPresenter::default();

        sim::start_session(&mut state, Arena::new(1024.0, 640.0).with_viewport(1280.0));
        while state.active {
            let events = timeline.advance(&mut state, HEADLESS_FRAME_DT as f64);
            present(&mut presenter, &state, &events);
            if let Some(id) = bot.choose(&state, timeline.now()) {
                sim::resolve_click(&mut state, id);
            }
        }

        if let Some(summary) = presenter.final_summary {
            println!("{}", summary);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Crab Spotter (native) starting...");
    log::info!("The browser build runs with `trunk serve`; natively a bot plays one session");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
