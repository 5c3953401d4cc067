//! Hand landmark aggregation
//!
//! The tracking provider delivers landmarks on its own cadence (camera frame
//! rate); the render loop reads whatever arrived last. The aggregator turns
//! that stream into a stable cursor position plus a smoothed speed:
//! - Palm centre (wrist + finger MCPs) as the reference point
//! - EMA-smoothed speed in canvas px/s, measured only between fresh results
//! - Exponential decay of speed while the hand is not visible

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::consts::LANDMARK_COUNT;

pub const WRIST: usize = 0;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const RING_MCP: usize = 13;
pub const PINKY_MCP: usize = 17;

/// Landmarks averaged into the palm reference point
pub const PALM_POINTS: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

/// Hand skeleton connections for rendering
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (0, 9), (9, 10), (10, 11), (11, 12),
    (0, 13), (13, 14), (14, 15), (15, 16),
    (0, 17), (17, 18), (18, 19), (19, 20),
    (5, 9),
];

/// One raw result from the tracking provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingFrame {
    /// Normalized [0,1]² points; empty when no hand was found
    pub landmarks: Vec<Vec2>,
    /// Bumped on every delivered result
    pub generation: u64,
}

/// Latest-result mailbox shared between the provider callback and the loop
#[derive(Debug, Clone, Default)]
pub struct TrackingSlot {
    inner: Rc<RefCell<TrackingFrame>>,
}

impl TrackingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh result (empty = no hand)
    pub fn publish(&self, landmarks: Vec<Vec2>) {
        let mut frame = self.inner.borrow_mut();
        frame.landmarks = landmarks;
        frame.generation += 1;
    }

    /// Store a "no hand" result
    pub fn publish_empty(&self) {
        self.publish(Vec::new());
    }

    /// Store a result given as flat x,y pairs
    pub fn publish_flat(&self, coords: &[f32]) {
        let landmarks = coords
            .chunks_exact(2)
            .map(|c| Vec2::new(c[0], c[1]))
            .collect();
        self.publish(landmarks);
    }

    /// Copy of the last delivered result
    pub fn latest(&self) -> TrackingFrame {
        self.inner.borrow().clone()
    }
}

/// What the simulation sees of the hand this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandSample {
    /// Landmarks in canvas px (0 or 21 entries)
    pub landmarks: Vec<Vec2>,
    pub is_visible: bool,
    /// Smoothed speed of the palm centre in px/s
    pub velocity: f32,
    /// Palm centre in canvas px (last known when not visible)
    pub position: Vec2,
}

impl HandSample {
    /// A visible hand at `position` moving at `velocity`, without landmarks
    pub fn at(position: Vec2, velocity: f32) -> Self {
        Self {
            landmarks: Vec::new(),
            is_visible: true,
            velocity,
            position,
        }
    }

    pub fn hidden() -> Self {
        Self::default()
    }
}

/// Aggregator tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    /// EMA weight of each new raw speed (0..1]
    pub alpha: f32,
    /// Speed decay rate while hidden (1/s)
    pub decay_rate: f32,
    /// Raw speeds below this are treated as 0 (px/s)
    pub dead_zone: f32,
    /// Flip x (selfie camera)
    pub mirror: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            alpha: 0.35,
            decay_rate: 6.0,
            dead_zone: 15.0,
            mirror: true,
        }
    }
}

/// Turns raw tracking frames into `HandSample`s
#[derive(Debug, Clone)]
pub struct LandmarkAggregator {
    config: AggregatorConfig,
    bounds: Vec2,
    last_generation: Option<u64>,
    /// Reference point of the previous fresh visible frame
    last_point: Option<Vec2>,
    /// Seconds since the previous fresh frame
    since_fresh: f32,
    sample: HandSample,
}

impl LandmarkAggregator {
    pub fn new(config: AggregatorConfig, bounds: Vec2) -> Self {
        Self {
            config,
            bounds,
            last_generation: None,
            last_point: None,
            since_fresh: 0.0,
            sample: HandSample::default(),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }

    pub fn sample(&self) -> &HandSample {
        &self.sample
    }

    /// Forget all smoothing state (new session)
    pub fn reset(&mut self) {
        self.last_generation = None;
        self.last_point = None;
        self.since_fresh = 0.0;
        self.sample = HandSample::default();
    }

    /// Map a normalized landmark to canvas px
    pub fn to_canvas(&self, p: Vec2) -> Vec2 {
        let x = if self.config.mirror { 1.0 - p.x } else { p.x };
        Vec2::new(x * self.bounds.x, p.y * self.bounds.y)
    }

    fn decay(&mut self, dt: f32) {
        self.sample.velocity *= (-self.config.decay_rate * dt).exp();
    }

    /// Fold the latest frame into the sample. `dt` is the tick length.
    pub fn update(&mut self, frame: &TrackingFrame, dt: f32) -> &HandSample {
        self.since_fresh += dt;

        if self.last_generation == Some(frame.generation) {
            // Provider hasn't delivered anything new; keep the last reading
            if !self.sample.is_visible {
                self.decay(dt);
            }
            return &self.sample;
        }
        self.last_generation = Some(frame.generation);
        let elapsed = std::mem::take(&mut self.since_fresh);

        if frame.landmarks.len() != LANDMARK_COUNT {
            if !frame.landmarks.is_empty() {
                log::debug!("Ignoring frame with {} landmarks", frame.landmarks.len());
            }
            self.sample.is_visible = false;
            self.sample.landmarks.clear();
            self.last_point = None;
            self.decay(dt);
            return &self.sample;
        }

        let landmarks: Vec<Vec2> = frame.landmarks.iter().map(|&p| self.to_canvas(p)).collect();
        let point = PALM_POINTS.iter().map(|&i| landmarks[i]).sum::<Vec2>() / PALM_POINTS.len() as f32;

        match self.last_point {
            Some(prev) if elapsed > 0.0 => {
                let raw = point.distance(prev) / elapsed;
                let raw = if raw < self.config.dead_zone { 0.0 } else { raw };
                self.sample.velocity += self.config.alpha * (raw - self.sample.velocity);
            }
            // Reappearing: seed the reference point, no speed spike
            _ => self.decay(dt),
        }

        self.last_point = Some(point);
        self.sample.landmarks = landmarks;
        self.sample.position = point;
        self.sample.is_visible = true;
        &self.sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    /// 21 landmarks all at one normalized point
    fn hand_at(x: f32, y: f32) -> Vec<Vec2> {
        vec![Vec2::new(x, y); LANDMARK_COUNT]
    }

    fn aggregator() -> LandmarkAggregator {
        let config = AggregatorConfig {
            mirror: false,
            ..Default::default()
        };
        LandmarkAggregator::new(config, Vec2::new(1000.0, 1000.0))
    }

    #[test]
    fn test_empty_frame_is_hidden() {
        let mut agg = aggregator();
        let slot = TrackingSlot::new();
        slot.publish_empty();
        let s = agg.update(&slot.latest(), DT);
        assert!(!s.is_visible);
        assert!(s.landmarks.is_empty());
    }

    #[test]
    fn test_position_is_palm_centre() {
        let mut agg = aggregator();
        let slot = TrackingSlot::new();
        let mut lm = hand_at(0.5, 0.5);
        lm[WRIST] = Vec2::new(0.5, 0.75);
        slot.publish(lm);
        let s = agg.update(&slot.latest(), DT);
        assert!(s.is_visible);
        assert!((s.position.y - 550.0).abs() < 0.01);
    }

    #[test]
    fn test_mirror_flips_x() {
        let agg = LandmarkAggregator::new(AggregatorConfig::default(), Vec2::new(1000.0, 500.0));
        assert_eq!(agg.to_canvas(Vec2::new(0.25, 0.5)), Vec2::new(750.0, 250.0));
    }

    #[test]
    fn test_velocity_smoothed() {
        let mut agg = aggregator();
        let slot = TrackingSlot::new();
        slot.publish(hand_at(0.1, 0.5));
        agg.update(&slot.latest(), DT);
        // 0.1 normalized = 100 px in one tick = 6000 px/s raw
        slot.publish(hand_at(0.2, 0.5));
        let v = agg.update(&slot.latest(), DT).velocity;
        assert!((v - 0.35 * 6000.0).abs() < 1.0);
    }

    #[test]
    fn test_stale_frame_keeps_reading() {
        let mut agg = aggregator();
        let slot = TrackingSlot::new();
        slot.publish(hand_at(0.1, 0.5));
        agg.update(&slot.latest(), DT);
        slot.publish(hand_at(0.2, 0.5));
        let v1 = agg.update(&slot.latest(), DT).velocity;
        // Loop runs faster than the provider: same generation again
        let v2 = agg.update(&slot.latest(), DT).velocity;
        assert_eq!(v1, v2);
        // Next fresh frame measures over both ticks
        slot.publish(hand_at(0.3, 0.5));
        let v3 = agg.update(&slot.latest(), DT).velocity;
        let expected = v1 + 0.35 * (3000.0 - v1);
        assert!((v3 - expected).abs() < 1.0);
    }

    #[test]
    fn test_dropout_decays_smoothly() {
        let mut agg = aggregator();
        let slot = TrackingSlot::new();
        for i in 0..10 {
            slot.publish(hand_at(0.1 + i as f32 * 0.05, 0.5));
            agg.update(&slot.latest(), DT);
        }
        let fast = agg.sample().velocity;
        assert!(fast > 1000.0);

        slot.publish_empty();
        let hidden = agg.update(&slot.latest(), DT).velocity;
        assert!(hidden > 0.0 && hidden < fast);
        assert!(hidden > fast * 0.8, "no sudden drop");

        // Reappears far away: no spike
        slot.publish(hand_at(0.9, 0.9));
        let back = agg.update(&slot.latest(), DT);
        assert!(back.is_visible);
        assert!(back.velocity < hidden);
    }

    #[test]
    fn test_bad_landmark_count_is_hidden() {
        let mut agg = aggregator();
        let slot = TrackingSlot::new();
        slot.publish(vec![Vec2::splat(0.5); 5]);
        assert!(!agg.update(&slot.latest(), DT).is_visible);
    }

    #[test]
    fn test_publish_flat() {
        let slot = TrackingSlot::new();
        slot.publish_flat(&[0.1, 0.2, 0.3, 0.4]);
        let f = slot.latest();
        assert_eq!(f.generation, 1);
        assert_eq!(f.landmarks, vec![Vec2::new(0.1, 0.2), Vec2::new(0.3, 0.4)]);
    }
}
