//! Star Sweep entry point
//!
//! On the web this wires the DOM, the camera bridge and the frame loop
//! around a `Host`. Natively it plays one scripted session per mode.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlVideoElement};

    use star_sweep::audio::AudioManager;
    use star_sweep::consts::SIM_DT;
    use star_sweep::host::TrackingStatus;
    use star_sweep::platform::{FrameLoop, start_hand_tracking};
    use star_sweep::renderer::{canvas, scene};
    use star_sweep::tracking::TrackingSlot;
    use star_sweep::{Host, Screen, Settings, TrackingError, message};

    /// Everything the page callbacks share
    struct App {
        host: Host,
        slot: TrackingSlot,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        document: Document,
        audio: AudioManager,
        last_time: f64,
    }

    type Shared = Rc<RefCell<App>>;

    impl App {
        fn bounds(&self) -> Vec2 {
            Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
        }

        /// Match the backing store to the laid-out size
        fn fit_canvas(&mut self) {
            let w = self.canvas.client_width().max(1) as u32;
            let h = self.canvas.client_height().max(1) as u32;
            if w != self.canvas.width() || h != self.canvas.height() {
                self.canvas.set_width(w);
                self.canvas.set_height(h);
                let bounds = self.bounds();
                self.host.set_bounds(bounds);
                log::debug!("Canvas resized to {w}x{h}");
            }
        }

        /// One animation frame. Returns whether the loop should continue.
        fn frame(&mut self, time: f64) -> bool {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;

            let tracking = self.slot.latest();
            self.host.frame(dt, &tracking);

            for cue in self.host.hud_mut().drain_cues() {
                self.audio.play(cue);
            }

            self.render();
            self.update_hud();

            if self.host.screen() != Screen::Playing {
                self.sync_screens();
                return false;
            }
            true
        }

        fn render(&self) {
            let engine = self.host.engine();
            let cmds = scene::build(engine.session(), engine.hand(), self.host.settings());
            canvas::draw(
                &self.ctx,
                self.canvas.width() as f64,
                self.canvas.height() as f64,
                &cmds,
            );
        }

        fn update_hud(&self) {
            let doc = &self.document;
            let hud = self.host.hud();
            set_text(doc, "hud-score", &hud.score.to_string());
            set_text(doc, "hud-health", &hud.health.to_string());
            show(doc, "hud-health-item", self.host.mode().has_health());
            set_text(doc, "hud-time", &self.host.time_left().to_string());
            set_text(doc, "hud-feedback", hud.feedback_text().unwrap_or(""));
            show(doc, "hand-prompt", self.host.hand_prompt());
        }

        /// Show the panel for the current screen and the tracking banner
        fn sync_screens(&self) {
            let doc = &self.document;
            let screen = self.host.screen();
            show(doc, "lobby", screen == Screen::Lobby);
            show(doc, "instructions", screen == Screen::Instructions);
            show(doc, "hud", screen == Screen::Playing);
            show(doc, "finished", screen == Screen::Finished);

            let tracking = self.host.tracking();
            show(doc, "tracking-loading", matches!(tracking, TrackingStatus::Loading));
            show(doc, "tracking-error", matches!(tracking, TrackingStatus::Failed(_)));
            if let TrackingStatus::Failed(err) = tracking {
                set_text(doc, "tracking-error-text", &err.to_string());
            }

            if let Some(summary) = self.host.summary() {
                set_text(doc, "final-score", &summary.score.to_string());
                set_text(doc, "final-mode", summary.mode.title());
            }
            set_text(doc, "final-message", self.host.message());
        }
    }

    fn set_text(doc: &Document, id: &str, text: &str) {
        if let Some(el) = doc.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn show(doc: &Document, id: &str, visible: bool) {
        if let Some(el) = doc.get_element_by_id(id) {
            let _ = if visible {
                el.remove_attribute("hidden")
            } else {
                el.set_attribute("hidden", "")
            };
        }
    }

    fn on_click<F>(el: &Element, mut handler: F)
    where
        F: FnMut() + 'static,
    {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| handler());
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Open the camera; the result flips the host's tracking status
    fn start_tracking(app: &Shared) {
        let (video, slot) = {
            let a = app.borrow();
            let video = a
                .document
                .get_element_by_id("video")
                .and_then(|el| el.dyn_into::<HtmlVideoElement>().ok());
            (video, a.slot.clone())
        };

        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = match video {
                Some(video) => start_hand_tracking(&video, slot).await,
                None => Err(TrackingError::Unavailable("no #video element".into())),
            };
            let mut a = app.borrow_mut();
            match result {
                Ok(()) => a.host.tracking_ready(),
                Err(e) => a.host.tracking_failed(e),
            }
            a.sync_screens();
        });
    }

    fn request_closing_message(app: &Shared) {
        let request = app.borrow_mut().host.take_message_request();
        let Some((score, mode)) = request else {
            return;
        };
        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = message::request_message(score, mode).await;
            let mut a = app.borrow_mut();
            a.host.apply_message(result);
            a.sync_screens();
        });
    }

    fn start_game(app: &Shared, frame_loop: &Rc<FrameLoop>, key: &str) {
        let seed = js_sys::Date::now() as u64;
        let started = {
            let mut a = app.borrow_mut();
            a.audio.resume();
            a.fit_canvas();
            let result = a.host.start_game_by_key(key, seed);
            if let Err(e) = &result {
                log::warn!("Cannot start {key}: {e}");
            }
            a.last_time = 0.0;
            a.sync_screens();
            a.update_hud();
            result.is_ok() && a.host.screen() == Screen::Playing
        };
        if !started {
            return;
        }

        log::info!("Starting {key} with seed {seed}");
        let loop_app = app.clone();
        frame_loop.start(move |time| {
            let keep_going = loop_app.borrow_mut().frame(time);
            if !keep_going {
                request_closing_message(&loop_app);
            }
            keep_going
        });
    }

    fn leave_to_lobby(app: &Shared, frame_loop: &FrameLoop) {
        frame_loop.cancel();
        let mut a = app.borrow_mut();
        a.host.back_to_lobby();
        a.sync_screens();
    }

    fn setup_buttons(app: &Shared, frame_loop: &Rc<FrameLoop>) -> Result<(), JsValue> {
        let document = app.borrow().document.clone();

        let buttons = document.query_selector_all(".mode-btn")?;
        for i in 0..buttons.length() {
            let Some(btn) = buttons.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let Some(key) = btn.get_attribute("data-mode") else {
                log::warn!("Mode button without data-mode");
                continue;
            };
            let (app, frame_loop) = (app.clone(), frame_loop.clone());
            on_click(&btn, move || start_game(&app, &frame_loop, &key));
        }

        if let Some(btn) = document.get_element_by_id("instructions-btn") {
            let app = app.clone();
            on_click(&btn, move || {
                let mut a = app.borrow_mut();
                a.host.show_instructions();
                a.sync_screens();
            });
        }

        for id in ["instructions-close-btn", "stop-btn", "lobby-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let (app, frame_loop) = (app.clone(), frame_loop.clone());
                on_click(&btn, move || leave_to_lobby(&app, &frame_loop));
            }
        }

        if let Some(btn) = document.get_element_by_id("play-again-btn") {
            let (app, frame_loop) = (app.clone(), frame_loop.clone());
            on_click(&btn, move || {
                let key = app.borrow().host.mode().as_key();
                start_game(&app, &frame_loop, key);
            });
        }

        if let Some(btn) = document.get_element_by_id("retry-btn") {
            let app = app.clone();
            on_click(&btn, move || {
                {
                    let mut a = app.borrow_mut();
                    a.host.retry_tracking();
                    a.sync_screens();
                }
                start_tracking(&app);
            });
        }

        if let Some(btn) = document.get_element_by_id("sound-btn") {
            let app = app.clone();
            on_click(&btn, move || {
                let mut a = app.borrow_mut();
                let settings = Settings {
                    sound: !a.host.settings().sound,
                    ..a.host.settings().clone()
                };
                settings.save();
                a.audio.set_volume(settings.effective_volume());
                let label = if settings.sound { "Sound: on" } else { "Sound: off" };
                a.host.set_settings(settings);
                set_text(&a.document, "sound-btn", label);
            });
        }

        Ok(())
    }

    fn setup_window_handlers(app: &Shared, frame_loop: &Rc<FrameLoop>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                app.borrow_mut().fit_canvas();
            });
            window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        {
            let (app, frame_loop) = (app.clone(), frame_loop.clone());
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if event.key() == "Escape" && app.borrow().host.screen() != Screen::Lobby {
                    leave_to_lobby(&app, &frame_loop);
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Star Sweep starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no #canvas element")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("2d context unavailable")?
            .dyn_into()?;

        let settings = Settings::load();
        let mut audio = AudioManager::new();
        audio.set_volume(settings.effective_volume());
        set_text(
            &document,
            "sound-btn",
            if settings.sound { "Sound: on" } else { "Sound: off" },
        );

        let bounds = Vec2::new(canvas.width() as f32, canvas.height() as f32);
        let app: Shared = Rc::new(RefCell::new(App {
            host: Host::new(bounds, settings),
            slot: TrackingSlot::new(),
            canvas,
            ctx,
            document,
            audio,
            last_time: 0.0,
        }));
        {
            let mut a = app.borrow_mut();
            a.fit_canvas();
            a.sync_screens();
        }

        let frame_loop = Rc::new(FrameLoop::new());
        setup_buttons(&app, &frame_loop)?;
        setup_window_handlers(&app, &frame_loop)?;
        start_tracking(&app);

        log::info!("Ready");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    web_app::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Star Sweep (native) starting...");
    log::info!("The camera game runs in the browser; playing scripted sessions instead");

    for mode in star_sweep::GameMode::ALL {
        demo_session(mode, 7);
    }
}

/// Play one session with a synthetic hand sweeping a circle
#[cfg(not(target_arch = "wasm32"))]
fn demo_session(mode: star_sweep::GameMode, seed: u64) {
    use glam::Vec2;
    use star_sweep::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, LANDMARK_COUNT, SIM_DT};
    use star_sweep::message::local_message;
    use star_sweep::tracking::TrackingSlot;
    use star_sweep::{Host, Screen, Settings, polar_to_cartesian};

    let settings = Settings {
        session_seconds: 30,
        ..Settings::load()
    };
    let bounds = Vec2::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT);
    let mut host = Host::new(bounds, settings);
    host.tracking_ready();
    if let Err(e) = host.start_game(mode, seed) {
        log::error!("Could not start {}: {e}", mode.title());
        return;
    }

    let slot = TrackingSlot::new();
    let mut t = 0.0f32;
    while host.screen() == Screen::Playing {
        // Slow laps in BREATHING, brisk sweeps elsewhere
        let rate = if mode == star_sweep::GameMode::Breathing { 0.3 } else { 2.5 };
        let palm = Vec2::splat(0.5) + polar_to_cartesian(0.3, t * rate);
        slot.publish(vec![palm; LANDMARK_COUNT]);
        host.frame(SIM_DT, &slot.latest());
        t += SIM_DT;
    }

    if let Some(summary) = host.summary() {
        println!(
            "{:<16} score {:>5}  collected {:>3}  health {:>3}  {:?} after {:.1}s",
            mode.title(),
            summary.score,
            summary.collected,
            summary.health,
            summary.reason,
            summary.elapsed_secs
        );
        println!("    {}", local_message(summary.score, summary.mode));
    }
}
