//! Game objects and per-session simulation state
//!
//! Everything a running session mutates lives on `Session`; the engine owns
//! exactly one of these at a time, so tearing a session down is a drop.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::mode::{EndReason, GameMode, ModeConfig, SessionSummary};

/// Object classification. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Star,
    Wisp,
    StressBubble,
    Target,
    Mist,
    Core,
    Shadow,
    Fragment,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Star => "star",
            ObjectKind::Wisp => "wisp",
            ObjectKind::StressBubble => "stress-bubble",
            ObjectKind::Target => "target",
            ObjectKind::Mist => "mist",
            ObjectKind::Core => "core",
            ObjectKind::Shadow => "shadow",
            ObjectKind::Fragment => "fragment",
        }
    }

    /// Whether the hand can ever affect this kind
    pub fn is_interactive(&self) -> bool {
        !matches!(self, ObjectKind::Core | ObjectKind::Fragment)
    }

    /// Kinds that march on the core in MIST_CLEAR
    pub fn is_darkness(&self) -> bool {
        matches!(self, ObjectKind::Shadow | ObjectKind::Mist)
    }

    /// Default CSS color
    pub fn color(&self) -> &'static str {
        match self {
            ObjectKind::Star => "#fff3b0",
            ObjectKind::Wisp => "#9be7ff",
            ObjectKind::StressBubble => "#c7b8ff",
            ObjectKind::Target => "#7ef0c2",
            ObjectKind::Mist => "#8a8fa8",
            ObjectKind::Core => "#ffc857",
            ObjectKind::Shadow => "#3b2f5c",
            ObjectKind::Fragment => "#d6ccff",
        }
    }
}

/// A live entity on the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    /// Unique among live objects, never reused within a session
    pub id: String,
    pub kind: ObjectKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Radius the breathing/shrinking animation is relative to
    pub base_radius: f32,
    pub color: String,
    pub opacity: f32,
    /// Animation phase in radians; rendering only
    pub pulse: f32,
    /// Seconds since spawn
    pub age: f32,
    /// SEQUENCE display label ("1".."N")
    pub label: Option<String>,
    /// Fill level / integrity in [0, 1]
    pub progress: Option<f32>,
    pub is_cleared: bool,
}

impl GameObject {
    pub fn new(id: String, kind: ObjectKind, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            radius,
            base_radius: radius,
            color: kind.color().to_string(),
            opacity: 1.0,
            pulse: 0.0,
            age: 0.0,
            label: None,
            progress: None,
            is_cleared: false,
        }
    }

    /// Numeric sequence label, if this is a target
    pub fn sequence_index(&self) -> Option<u32> {
        self.label.as_deref().and_then(|l| l.parse().ok())
    }

    /// Set progress, clamped to [0, 1]
    pub fn set_progress(&mut self, value: f32) {
        self.progress = Some(value.clamp(0.0, 1.0));
    }

    /// True once the object must be pruned at the next boundary
    pub fn is_dead(&self) -> bool {
        self.is_cleared || self.radius <= 0.0
    }
}

/// Something the host or audio layer should hear about
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// An object was collected or cleared by the hand
    Collected {
        kind: ObjectKind,
        points: u32,
        label: Option<String>,
        pos: Vec2,
        /// Consecutive collections including this one
        chain: u32,
    },
    /// Core integrity changed; value is the new health (0..=100)
    HealthChanged(u32),
    /// SEQUENCE moved on; `next` is the new expected label
    SequenceAdvanced { next: u32 },
    /// A terminal condition fired inside the simulation
    SessionEnded(EndReason),
}

/// State of one play-through
#[derive(Debug, Clone)]
pub struct Session {
    pub config: ModeConfig,
    pub seed: u64,
    pub rng: Pcg32,
    /// Canvas size in px
    pub bounds: Vec2,
    /// Live objects in spawn order
    pub objects: Vec<GameObject>,
    pub score: u64,
    pub collected: u32,
    /// Next SEQUENCE label required (starts at 1)
    pub expected_label: u32,
    pub time_ticks: u64,
    pub elapsed: f32,
    /// Seconds accumulated toward the next periodic spawn
    pub spawn_timer: f32,
    /// Consecutive collections, drives the chime scale
    pub chain: u32,
    /// Set once a terminal condition fires
    pub ended: Option<EndReason>,
    next_id: u32,
}

impl Session {
    pub fn new(config: ModeConfig, seed: u64, bounds: Vec2) -> Self {
        Self {
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bounds,
            objects: Vec::new(),
            score: 0,
            collected: 0,
            expected_label: 1,
            time_ticks: 0,
            elapsed: 0.0,
            spawn_timer: 0.0,
            chain: 0,
            ended: None,
            next_id: 1,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.config.mode
    }

    /// Allocate a new object id for `kind`
    pub fn next_object_id(&mut self, kind: ObjectKind) -> String {
        let id = format!("{}-{}", kind.as_str(), self.next_id);
        self.next_id += 1;
        id
    }

    pub fn center(&self) -> Vec2 {
        self.bounds * 0.5
    }

    pub fn core(&self) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.kind == ObjectKind::Core)
    }

    pub fn core_mut(&mut self) -> Option<&mut GameObject> {
        self.objects.iter_mut().find(|o| o.kind == ObjectKind::Core)
    }

    /// Host-facing health: core integrity in MIST_CLEAR, initial health otherwise
    pub fn health(&self) -> u32 {
        match self.core().and_then(|c| c.progress) {
            Some(p) => ModeConfig::health_from_progress(p),
            None => self.config.initial_health,
        }
    }

    /// Live objects counted against the spawn budget
    pub fn budget_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| o.kind.is_interactive() && !o.is_dead())
            .count()
    }

    pub fn summary(&self, reason: EndReason) -> SessionSummary {
        SessionSummary {
            mode: self.mode(),
            score: self.score,
            health: self.health(),
            collected: self.collected,
            expected_label: self.expected_label,
            elapsed_secs: self.elapsed,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_tagged() {
        let mut s = Session::new(ModeConfig::adventure(), 1, Vec2::new(800.0, 600.0));
        let a = s.next_object_id(ObjectKind::Star);
        let b = s.next_object_id(ObjectKind::Star);
        assert_ne!(a, b);
        assert!(a.starts_with("star-"));
    }

    #[test]
    fn test_progress_clamped() {
        let mut o = GameObject::new("t".into(), ObjectKind::Target, Vec2::ZERO, 10.0);
        o.set_progress(1.7);
        assert_eq!(o.progress, Some(1.0));
        o.set_progress(-3.0);
        assert_eq!(o.progress, Some(0.0));
    }

    #[test]
    fn test_sequence_index_parses_label() {
        let mut o = GameObject::new("t".into(), ObjectKind::Target, Vec2::ZERO, 10.0);
        assert_eq!(o.sequence_index(), None);
        o.label = Some("4".into());
        assert_eq!(o.sequence_index(), Some(4));
    }

    #[test]
    fn test_health_without_core_is_initial() {
        let s = Session::new(ModeConfig::adventure(), 1, Vec2::new(800.0, 600.0));
        assert_eq!(s.health(), 100);
    }
}
