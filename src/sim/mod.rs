//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod interaction;
pub mod mode;
pub mod spawn;
pub mod state;
pub mod tick;

pub use interaction::{in_reach, resolve, resolve_core_arrivals};
pub use mode::{EndReason, GameMode, ModeConfig, SessionSummary};
pub use spawn::{advance, populate_initial, prune, spawn};
pub use state::{GameEvent, GameObject, ObjectKind, Session};
pub use tick::{begin_session, tick};
