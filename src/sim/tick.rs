//! Fixed timestep simulation tick
//!
//! Advances one session deterministically: same seed, same hand samples,
//! same events.

use glam::Vec2;

use super::interaction::{resolve, resolve_core_arrivals};
use super::mode::ModeConfig;
use super::spawn::{advance, populate_initial, prune, spawn};
use super::state::{GameEvent, Session};
use crate::tracking::HandSample;

/// Fresh session with the mode's fixed initial objects in place
pub fn begin_session(config: ModeConfig, seed: u64, bounds: Vec2) -> Session {
    log::info!("Starting {} session (seed {seed})", config.mode.as_key());
    let mut session = Session::new(config, seed, bounds);
    populate_initial(&mut session);
    session
}

/// Advance the session by one fixed timestep
pub fn tick(session: &mut Session, hand: &HandSample, dt: f32, events: &mut Vec<GameEvent>) {
    // Ended sessions are frozen until the host tears them down
    if session.ended.is_some() {
        return;
    }

    session.time_ticks += 1;
    session.elapsed += dt;

    advance(session, dt);
    spawn(session, dt);
    resolve(session, hand, events);
    resolve_core_arrivals(session, events);

    let removed = prune(session);
    if removed > 0 {
        log::trace!("Pruned {removed} objects at tick {}", session.time_ticks);
    }
}
