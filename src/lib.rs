//! Star Sweep - a hand-tracked motion game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (object pool, interaction, mode rules)
//! - `tracking`: Hand landmark aggregation (position + smoothed velocity)
//! - `engine`: Session ownership and the per-frame driver
//! - `host`: Screen flow, countdown and HUD counters around the engine
//! - `renderer`: Draw list building and the Canvas2D backend
//! - `platform`: Browser glue (animation frames, tracking bridge)

pub mod audio;
pub mod engine;
pub mod error;
pub mod host;
pub mod message;
#[cfg(target_arch = "wasm32")]
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tracking;

pub use engine::{Engine, GameEvents};
pub use error::{MessageError, SettingsError, TrackingError};
pub use host::{Host, Screen};
pub use settings::Settings;
pub use sim::{GameMode, ModeConfig};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one step per display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest frame delta accepted before clamping (tab switches, stalls)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Canvas size used when no real canvas is attached (native, tests)
    pub const DEFAULT_CANVAS_WIDTH: f32 = 1280.0;
    pub const DEFAULT_CANVAS_HEIGHT: f32 = 720.0;

    /// Landmarks per tracked hand
    pub const LANDMARK_COUNT: usize = 21;

    /// Health shown by the host at full core integrity
    pub const MAX_HEALTH: u32 = 100;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Rotate a unit heading by `delta` radians
#[inline]
pub fn rotate(v: Vec2, delta: f32) -> Vec2 {
    let (s, c) = delta.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}
