//! Hosting screen around the engine
//!
//! Owns the screen router, the whole-second countdown, the HUD counters
//! and the closing-message hand-off. Nothing here touches the DOM; the
//! browser entry point reads this state each frame and mirrors it.

use glam::Vec2;

use crate::audio::SoundEffect;
use crate::engine::{Engine, GameEvents};
use crate::error::{MessageError, TrackingError};
use crate::message::{self, WAITING_MESSAGE};
use crate::settings::Settings;
use crate::sim::{EndReason, GameEvent, GameMode, ModeConfig, SessionSummary};
use crate::tracking::TrackingFrame;

/// Seconds a feedback label stays on screen
pub const FEEDBACK_SECS: f32 = 0.8;

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Lobby,
    Instructions,
    Playing,
    Finished,
}

/// Camera / tracking startup state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingStatus {
    Loading,
    Ready,
    Failed(TrackingError),
}

impl TrackingStatus {
    /// Back to loading for another attempt
    pub fn retry(&mut self) {
        *self = TrackingStatus::Loading;
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, TrackingStatus::Ready)
    }
}

/// HUD counters; also the engine's event sink
#[derive(Debug, Clone, Default)]
pub struct Hud {
    pub score: u64,
    pub health: u32,
    /// Feedback label and seconds remaining
    pub feedback: Option<(String, f32)>,
    /// Sound cues queued since the last drain
    cues: Vec<SoundEffect>,
}

impl Hud {
    fn reset(&mut self, health: u32) {
        self.score = 0;
        self.health = health;
        self.feedback = None;
        self.cues.clear();
    }

    fn tick(&mut self, dt: f32) {
        if let Some((_, left)) = self.feedback.as_mut() {
            *left -= dt;
            if *left <= 0.0 {
                self.feedback = None;
            }
        }
    }

    pub fn feedback_text(&self) -> Option<&str> {
        self.feedback.as_ref().map(|(text, _)| text.as_str())
    }

    /// Take queued sound cues
    pub fn drain_cues(&mut self) -> Vec<SoundEffect> {
        std::mem::take(&mut self.cues)
    }
}

impl GameEvents for Hud {
    fn on_object_collected(&mut self, points: u32, label: Option<&str>) {
        self.score += points as u64;
        let text = label.map_or_else(|| format!("+{points}"), str::to_string);
        self.feedback = Some((text, FEEDBACK_SECS));
    }

    fn on_health_change(&mut self, health: u32) {
        self.health = health;
    }

    fn on_event(&mut self, event: &GameEvent) {
        if let Some(cue) = SoundEffect::for_event(event) {
            self.cues.push(cue);
        }
    }
}

/// Screen flow and session bookkeeping around one `Engine`
pub struct Host {
    screen: Screen,
    tracking: TrackingStatus,
    engine: Engine,
    hud: Hud,
    settings: Settings,
    mode: GameMode,
    time_left: u32,
    second_timer: f32,
    summary: Option<SessionSummary>,
    message: Option<String>,
    message_pending: bool,
}

impl Host {
    pub fn new(bounds: Vec2, settings: Settings) -> Self {
        let mut engine = Engine::new(bounds, settings.aggregator());
        engine.set_sensitivity(settings.gesture_sensitivity);
        Self {
            screen: Screen::Lobby,
            tracking: TrackingStatus::Loading,
            engine,
            hud: Hud::default(),
            time_left: settings.session_seconds,
            settings,
            mode: GameMode::Adventure,
            second_timer: 0.0,
            summary: None,
            message: None,
            message_pending: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn tracking(&self) -> &TrackingStatus {
        &self.tracking
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut Hud {
        &mut self.hud
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Replace preferences. A running session keeps its tuning; camera
    /// mirroring is fixed when the host is built.
    pub fn set_settings(&mut self, settings: Settings) {
        self.engine.set_sensitivity(settings.gesture_sensitivity);
        if self.screen != Screen::Playing {
            self.time_left = settings.session_seconds;
        }
        self.settings = settings;
    }

    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.engine.set_bounds(bounds);
    }

    pub fn tracking_ready(&mut self) {
        log::info!("Hand tracking ready");
        self.tracking = TrackingStatus::Ready;
    }

    pub fn tracking_failed(&mut self, err: TrackingError) {
        log::error!("Hand tracking failed: {err}");
        self.tracking = TrackingStatus::Failed(err);
    }

    /// Retry action on the error banner
    pub fn retry_tracking(&mut self) {
        self.tracking.retry();
    }

    pub fn show_instructions(&mut self) {
        if self.screen == Screen::Lobby {
            self.screen = Screen::Instructions;
        }
    }

    /// Lobby mode buttons carry string keys. An unknown key is an
    /// integration bug; release builds log it and stay in the lobby.
    pub fn start_game_by_key(&mut self, key: &str, seed: u64) -> Result<(), TrackingError> {
        let mode = GameMode::from_key(key);
        debug_assert!(mode.is_some(), "unknown game mode key {key:?}");
        match mode {
            Some(mode) => self.start_game(mode, seed),
            None => {
                log::error!("Ignoring unknown game mode key {key:?}");
                Ok(())
            }
        }
    }

    /// Start (or restart) a session. Needs tracking to be up.
    pub fn start_game(&mut self, mode: GameMode, seed: u64) -> Result<(), TrackingError> {
        match &self.tracking {
            TrackingStatus::Ready => {}
            TrackingStatus::Loading => return Err(TrackingError::NotReady),
            TrackingStatus::Failed(e) => return Err(e.clone()),
        }

        let mut config = ModeConfig::for_mode(mode).with_sensitivity(self.settings.gesture_sensitivity);
        config.session_seconds = self.settings.session_seconds;

        self.mode = mode;
        self.hud.reset(config.initial_health);
        self.time_left = config.session_seconds;
        self.second_timer = 0.0;
        self.summary = None;
        self.message = None;
        self.message_pending = false;
        self.engine.start_session_with(config, seed);
        self.screen = Screen::Playing;
        Ok(())
    }

    /// One display frame while playing
    pub fn frame(&mut self, dt: f32, tracking: &TrackingFrame) {
        self.hud.tick(dt);
        if self.screen != Screen::Playing {
            return;
        }

        if let Some(summary) = self.engine.frame(dt, tracking, &mut self.hud) {
            self.conclude(summary);
            return;
        }

        self.second_timer += dt;
        while self.second_timer >= 1.0 && self.time_left > 0 {
            self.second_timer -= 1.0;
            self.time_left -= 1;
        }
        if self.time_left == 0 {
            self.finish(EndReason::TimeUp);
        }
    }

    /// End the running session and show the finished screen
    pub fn finish(&mut self, reason: EndReason) {
        if let Some(summary) = self.engine.finish_session(reason) {
            self.hud.on_event(&GameEvent::SessionEnded(summary.reason));
            self.conclude(summary);
        }
    }

    fn conclude(&mut self, summary: SessionSummary) {
        self.hud.score = summary.score;
        if summary.mode.has_health() {
            self.hud.health = summary.health;
        }
        self.summary = Some(summary);
        self.message = None;
        self.message_pending = true;
        self.screen = Screen::Finished;
    }

    /// Navigation away from the playing screen stops the session
    pub fn back_to_lobby(&mut self) {
        if self.engine.stop_session().is_some() {
            log::info!("Left the session from the {:?} screen", self.screen);
        }
        self.message_pending = false;
        self.screen = Screen::Lobby;
    }

    /// Score and mode for a pending closing-message request. Returns
    /// `Some` once per finished session.
    pub fn take_message_request(&mut self) -> Option<(u64, GameMode)> {
        if !self.message_pending {
            return None;
        }
        self.message_pending = false;
        self.summary.as_ref().map(|s| (s.score, s.mode))
    }

    /// Store the provider's answer, or the fallback on failure
    pub fn apply_message(&mut self, result: Result<String, MessageError>) {
        if self.screen != Screen::Finished {
            log::debug!("Dropping closing message that arrived after navigation");
            return;
        }
        let text = match (result, self.summary.as_ref()) {
            // No provider on this page: use the offline generator
            (Err(MessageError::Unavailable), Some(s)) => message::local_message(s.score, s.mode),
            (result, _) => message::resolve(result),
        };
        self.message = Some(text);
    }

    /// Closing text for the finished screen
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(WAITING_MESSAGE)
    }

    /// "Show your hand" prompt while playing without a visible hand
    pub fn hand_prompt(&self) -> bool {
        self.screen == Screen::Playing && !self.engine.hand().is_visible
    }
}
