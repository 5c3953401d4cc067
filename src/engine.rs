//! Session owner and per-frame driver
//!
//! `Engine` is the only place a `Session` lives. The render loop calls
//! `frame` once per display frame; the engine folds in the latest tracking
//! result, runs as many fixed ticks as the frame time allows and forwards
//! the resulting events to a `GameEvents` sink.

use glam::Vec2;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::sim::{EndReason, GameEvent, GameMode, ModeConfig, Session, SessionSummary, begin_session, tick};
use crate::tracking::{AggregatorConfig, HandSample, LandmarkAggregator, TrackingFrame};

/// Host-side receiver for gameplay events. Called synchronously from
/// inside `Engine::frame`, at most once per qualifying object per tick.
pub trait GameEvents {
    fn on_object_collected(&mut self, points: u32, label: Option<&str>);

    /// New health in 0..=100
    fn on_health_change(&mut self, health: u32);

    fn on_session_end(&mut self, _summary: &SessionSummary) {}

    /// Every raw event, before the typed callbacks
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Sink that drops everything (headless runs)
impl GameEvents for () {
    fn on_object_collected(&mut self, _points: u32, _label: Option<&str>) {}
    fn on_health_change(&mut self, _health: u32) {}
}

/// Owns the running session, the aggregator and the tick accumulator
pub struct Engine {
    session: Option<Session>,
    aggregator: LandmarkAggregator,
    accumulator: f32,
    bounds: Vec2,
    sensitivity: f32,
    events: Vec<GameEvent>,
}

impl Engine {
    pub fn new(bounds: Vec2, aggregator: AggregatorConfig) -> Self {
        Self {
            session: None,
            aggregator: LandmarkAggregator::new(aggregator, bounds),
            accumulator: 0.0,
            bounds,
            sensitivity: 1.0,
            events: Vec::new(),
        }
    }

    /// Gesture sensitivity applied to sessions started from now on
    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    /// Canvas resize. Positions of live objects are kept as-is.
    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
        self.aggregator.set_bounds(bounds);
        if let Some(session) = self.session.as_mut() {
            session.bounds = bounds;
        }
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Start `mode` with its built-in tuning. Any running session is
    /// discarded without a summary.
    pub fn start_session(&mut self, mode: GameMode, seed: u64) {
        let config = ModeConfig::for_mode(mode).with_sensitivity(self.sensitivity);
        self.start_session_with(config, seed);
    }

    /// Start with an explicit configuration
    pub fn start_session_with(&mut self, config: ModeConfig, seed: u64) {
        if self.session.is_some() {
            log::debug!("Restarting: previous session discarded");
        }
        self.aggregator.reset();
        self.accumulator = 0.0;
        self.events.clear();
        self.session = Some(begin_session(config, seed, self.bounds));
    }

    /// Tear down the running session. Calling it while idle is a no-op.
    pub fn stop_session(&mut self) -> Option<SessionSummary> {
        self.finish_session(EndReason::Stopped)
    }

    /// Tear down with an explicit reason (host countdown uses `TimeUp`)
    pub fn finish_session(&mut self, reason: EndReason) -> Option<SessionSummary> {
        let session = self.session.take()?;
        let reason = session.ended.unwrap_or(reason);
        self.accumulator = 0.0;
        self.events.clear();
        self.aggregator.reset();
        let summary = session.summary(reason);
        log::info!(
            "Session over ({:?}): score {} in {:.1}s",
            summary.reason,
            summary.score,
            summary.elapsed_secs
        );
        Some(summary)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// A session exists and has not hit a terminal condition
    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.ended.is_none())
    }

    pub fn hand(&self) -> &HandSample {
        self.aggregator.sample()
    }

    /// One display frame. Returns the summary if the session ended inside
    /// this frame; the session itself is torn down in that case.
    pub fn frame<E: GameEvents>(
        &mut self,
        dt: f32,
        tracking: &TrackingFrame,
        sink: &mut E,
    ) -> Option<SessionSummary> {
        let session = self.session.as_mut()?;

        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let hand = self.aggregator.update(tracking, SIM_DT);
            tick(session, hand, SIM_DT, &mut self.events);
            self.accumulator -= SIM_DT;
            substeps += 1;
            if session.ended.is_some() {
                break;
            }
        }
        // Backlog beyond the substep cap is dropped, not replayed later
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        let mut ended = None;
        for event in self.events.drain(..) {
            sink.on_event(&event);
            match &event {
                GameEvent::Collected { points, label, .. } => {
                    sink.on_object_collected(*points, label.as_deref())
                }
                GameEvent::HealthChanged(health) => sink.on_health_change(*health),
                GameEvent::SequenceAdvanced { .. } => {}
                GameEvent::SessionEnded(reason) => ended = Some(*reason),
            }
        }

        let reason = ended?;
        let summary = self.finish_session(reason)?;
        sink.on_session_end(&summary);
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LANDMARK_COUNT;
    use crate::sim::ObjectKind;
    use crate::tracking::TrackingSlot;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Recorder {
        collected: Vec<(u32, Option<String>)>,
        health: Vec<u32>,
        ended: Vec<SessionSummary>,
    }

    impl GameEvents for Recorder {
        fn on_object_collected(&mut self, points: u32, label: Option<&str>) {
            self.collected.push((points, label.map(str::to_string)));
        }

        fn on_health_change(&mut self, health: u32) {
            self.health.push(health);
        }

        fn on_session_end(&mut self, summary: &SessionSummary) {
            self.ended.push(summary.clone());
        }
    }

    fn engine() -> Engine {
        let config = AggregatorConfig {
            mirror: false,
            ..Default::default()
        };
        Engine::new(Vec2::new(1280.0, 720.0), config)
    }

    #[test]
    fn test_idle_frame_is_noop() {
        let mut e = engine();
        let mut rec = Recorder::default();
        assert!(e.frame(0.016, &TrackingFrame::default(), &mut rec).is_none());
        assert!(!e.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut e = engine();
        e.start_session(GameMode::Adventure, 1);
        assert!(e.is_running());
        let first = e.stop_session();
        assert_eq!(first.map(|s| s.reason), Some(EndReason::Stopped));
        assert!(e.stop_session().is_none());
        assert!(e.session().is_none());
        assert!(!e.hand().is_visible);
    }

    #[test]
    fn test_restart_resets_state() {
        let mut e = engine();
        e.start_session(GameMode::Adventure, 1);
        let mut rec = Recorder::default();
        for _ in 0..120 {
            e.frame(1.0 / 60.0, &TrackingFrame::default(), &mut rec);
        }
        assert!(!e.session().unwrap().objects.is_empty());

        e.start_session(GameMode::Sequence, 2);
        let s = e.session().unwrap();
        assert_eq!(s.mode(), GameMode::Sequence);
        assert_eq!(s.objects.len(), 6);
        assert_eq!(s.score, 0);
        assert_eq!(s.time_ticks, 0);
    }

    #[test]
    fn test_substeps_are_capped() {
        let mut e = engine();
        e.start_session(GameMode::Adventure, 1);
        // A one second stall is clamped to MAX_FRAME_DT, then to MAX_SUBSTEPS
        e.frame(1.0, &TrackingFrame::default(), &mut ());
        assert_eq!(e.session().unwrap().time_ticks, MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_frame_reports_collection() {
        let mut e = engine();
        e.start_session(GameMode::Adventure, 1);
        {
            let s = e.session.as_mut().unwrap();
            let id = s.next_object_id(ObjectKind::Star);
            s.objects.push(crate::sim::GameObject::new(
                id,
                ObjectKind::Star,
                Vec2::new(640.0, 360.0),
                20.0,
            ));
        }
        let slot = TrackingSlot::new();
        slot.publish(vec![Vec2::new(0.5, 0.5); LANDMARK_COUNT]);
        let mut rec = Recorder::default();
        e.frame(SIM_DT * 1.5, &slot.latest(), &mut rec);
        assert_eq!(rec.collected, vec![(10, Some("+10".to_string()))]);
    }

    #[test]
    fn test_core_loss_ends_session() {
        let mut e = engine();
        let mut cfg = ModeConfig::mist_clear();
        cfg.core_damage = 1.0;
        e.start_session_with(cfg, 4);
        {
            let s = e.session.as_mut().unwrap();
            let center = s.center();
            let id = s.next_object_id(ObjectKind::Shadow);
            s.objects
                .push(crate::sim::GameObject::new(id, ObjectKind::Shadow, center, 20.0));
        }
        let mut rec = Recorder::default();
        let summary = e.frame(SIM_DT * 1.5, &TrackingFrame::default(), &mut rec);
        assert_eq!(rec.health, vec![0]);
        assert_eq!(summary.map(|s| s.reason), Some(EndReason::CoreExtinguished));
        assert_eq!(rec.ended.len(), 1);
        assert!(e.session().is_none());

        // Nothing left to report
        assert!(e.frame(SIM_DT, &TrackingFrame::default(), &mut rec).is_none());
        assert_eq!(rec.health, vec![0]);
    }

    proptest! {
        #[test]
        fn prop_stop_is_idempotent(
            mode in prop::sample::select(GameMode::ALL.to_vec()),
            seed in any::<u64>(),
            frames in 0usize..120,
            stops in 1usize..5,
        ) {
            let mut e = engine();
            e.start_session(mode, seed);
            for _ in 0..frames {
                e.frame(SIM_DT, &TrackingFrame::default(), &mut ());
            }
            let ran = e.session().is_some();
            let first = e.stop_session();
            prop_assert_eq!(first.is_some(), ran);
            for _ in 1..stops {
                prop_assert!(e.stop_session().is_none());
            }
            prop_assert!(!e.is_running());
            prop_assert!(e.session().is_none());
        }
    }
}
