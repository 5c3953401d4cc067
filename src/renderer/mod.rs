//! Canvas 2D rendering module
//!
//! `scene` turns the session into a flat draw list without touching the
//! browser; `canvas` replays that list on a 2D context.

pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use scene::{DrawCmd, build};
