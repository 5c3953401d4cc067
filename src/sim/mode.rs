//! Mode rules: one immutable tuning record per game mode
//!
//! Behavior lives in `spawn` and `interaction`; this module only holds the
//! numbers they are parameterized by, plus the end-of-session summary.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Game modes selectable from the lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// Free collection of drifting stars
    Adventure,
    /// Touch a ring of numbered targets in order
    Sequence,
    /// Slow, calm touches pop rising stress bubbles
    Breathing,
    /// Fast sweeps clear shadows before they reach the core
    MistClear,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Adventure,
        GameMode::Sequence,
        GameMode::Breathing,
        GameMode::MistClear,
    ];

    pub fn as_key(&self) -> &'static str {
        match self {
            GameMode::Adventure => "ADVENTURE",
            GameMode::Sequence => "SEQUENCE",
            GameMode::Breathing => "BREATHING",
            GameMode::MistClear => "MIST_CLEAR",
        }
    }

    /// Parse a lobby key. Unknown keys are a programming error at the call site.
    pub fn from_key(key: &str) -> Option<Self> {
        GameMode::ALL.into_iter().find(|m| m.as_key() == key)
    }

    /// Human-readable title for HUD and summary text
    pub fn title(&self) -> &'static str {
        match self {
            GameMode::Adventure => "Starlight Stroll",
            GameMode::Sequence => "Star Sequence",
            GameMode::Breathing => "Quiet Breath",
            GameMode::MistClear => "Lantern Guard",
        }
    }

    /// Whether the health meter is meaningful in this mode
    pub fn has_health(&self) -> bool {
        matches!(self, GameMode::MistClear)
    }
}

/// Tuning values for one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    pub mode: GameMode,
    /// Seconds between periodic spawns (0 = no periodic spawning)
    pub spawn_interval: f32,
    /// Cap on live interactive objects (core and fragments excluded)
    pub max_live_objects: usize,
    /// Base object speed in px/s
    pub object_speed: f32,
    /// Spawn radius range in px (min, max)
    pub radius_range: (f32, f32),
    /// Seconds before an uncollected object expires
    pub max_age: Option<f32>,
    /// Extra reach added to every object's radius for the hand test
    pub hand_radius: f32,
    /// Points for a regular collection
    pub points: u32,
    /// Points for the bonus variant (wisp, mist) or sequence completion
    pub bonus_points: u32,
    /// Chance that a spawn is the bonus variant
    pub bonus_chance: f32,
    /// Minimum hand speed (px/s) to clear shadows and mist
    pub fast_gesture_threshold: Option<f32>,
    /// Maximum hand speed (px/s) that still pops stress bubbles
    pub calm_threshold: Option<f32>,
    /// Number of sequence targets
    pub sequence_length: u32,
    /// Target ring radius as a fraction of the smaller canvas side
    pub ring_fraction: f32,
    /// Health at session start (0..=100)
    pub initial_health: u32,
    pub core_radius: f32,
    /// Core progress lost per uncontested arrival
    pub core_damage: f32,
    pub fragments_per_clear: u32,
    pub fragment_speed: f32,
    /// Fragment radius shrink in px/s
    pub fragment_shrink: f32,
    /// Seconds per breathing cycle for stress bubbles
    pub breath_period: f32,
    /// Session length the host counts down from
    pub session_seconds: u32,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self::adventure()
    }
}

impl ModeConfig {
    /// Built-in tuning for a mode
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Adventure => Self::adventure(),
            GameMode::Sequence => Self::sequence(),
            GameMode::Breathing => Self::breathing(),
            GameMode::MistClear => Self::mist_clear(),
        }
    }

    /// Built-in tuning with a JSON override on top. Fields missing from the
    /// JSON keep the mode's defaults; the mode itself cannot be changed.
    pub fn from_json(mode: GameMode, json: &str) -> Result<Self, SettingsError> {
        let mut value = serde_json::to_value(Self::for_mode(mode))?;
        let patch: serde_json::Value = serde_json::from_str(json)?;
        if let (Some(base), Some(patch)) = (value.as_object_mut(), patch.as_object()) {
            for (k, v) in patch {
                if k != "mode" {
                    base.insert(k.clone(), v.clone());
                }
            }
        }
        let config: Self = serde_json::from_value(value)?;
        Ok(config.sanitized())
    }

    /// Clamp values the rules cannot work with
    fn sanitized(mut self) -> Self {
        self.sequence_length = self.sequence_length.max(1);
        self.hand_radius = self.hand_radius.max(0.0);
        self
    }

    /// Number of targets on the SEQUENCE ring (never zero)
    pub fn target_count(&self) -> u32 {
        self.sequence_length.max(1)
    }

    fn base(mode: GameMode) -> Self {
        Self {
            mode,
            spawn_interval: 0.0,
            max_live_objects: 0,
            object_speed: 0.0,
            radius_range: (16.0, 16.0),
            max_age: None,
            hand_radius: 40.0,
            points: 10,
            bonus_points: 0,
            bonus_chance: 0.0,
            fast_gesture_threshold: None,
            calm_threshold: None,
            sequence_length: 6,
            ring_fraction: 0.32,
            initial_health: 100,
            core_radius: 46.0,
            core_damage: 0.1,
            fragments_per_clear: 5,
            fragment_speed: 120.0,
            fragment_shrink: 40.0,
            breath_period: 8.0,
            session_seconds: 60,
        }
    }

    pub fn adventure() -> Self {
        Self {
            spawn_interval: 0.5,
            max_live_objects: 24,
            object_speed: 30.0,
            radius_range: (12.0, 22.0),
            max_age: Some(8.0),
            points: 10,
            bonus_points: 25,
            bonus_chance: 0.15,
            ..Self::base(GameMode::Adventure)
        }
    }

    pub fn sequence() -> Self {
        Self {
            max_live_objects: 6,
            radius_range: (38.0, 38.0),
            points: 20,
            bonus_points: 50,
            sequence_length: 6,
            ..Self::base(GameMode::Sequence)
        }
    }

    pub fn breathing() -> Self {
        Self {
            spawn_interval: 1.2,
            max_live_objects: 10,
            object_speed: 25.0,
            radius_range: (24.0, 40.0),
            max_age: Some(14.0),
            points: 5,
            calm_threshold: Some(250.0),
            ..Self::base(GameMode::Breathing)
        }
    }

    pub fn mist_clear() -> Self {
        Self {
            spawn_interval: 0.9,
            max_live_objects: 16,
            object_speed: 55.0,
            radius_range: (18.0, 28.0),
            points: 15,
            bonus_points: 25,
            bonus_chance: 0.35,
            fast_gesture_threshold: Some(900.0),
            ..Self::base(GameMode::MistClear)
        }
    }

    /// Scale velocity thresholds by player sensitivity (>1 = easier fast
    /// gestures, more forgiving calm touches)
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        let s = sensitivity.clamp(0.25, 4.0);
        self.fast_gesture_threshold = self.fast_gesture_threshold.map(|t| t / s);
        self.calm_threshold = self.calm_threshold.map(|t| t * s);
        self
    }

    /// Core integrity as host-facing health
    pub fn health_from_progress(progress: f32) -> u32 {
        (progress.clamp(0.0, 1.0) * crate::consts::MAX_HEALTH as f32).round() as u32
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Host countdown reached zero
    TimeUp,
    /// MIST_CLEAR core progress reached zero
    CoreExtinguished,
    /// Every SEQUENCE target was cleared
    SequenceComplete,
    /// Host navigated away
    Stopped,
}

/// End-of-session scoring summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: GameMode,
    pub score: u64,
    pub health: u32,
    pub collected: u32,
    /// SEQUENCE only: the label that was still expected
    pub expected_label: u32,
    pub elapsed_secs: f32,
    pub reason: EndReason,
}
