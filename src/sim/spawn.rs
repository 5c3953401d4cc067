//! Object pool: spawning, motion and pruning
//!
//! Objects live in `Session::objects` in spawn order. Nothing here decides
//! gameplay outcomes; that is `interaction`'s job.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::Rng;

use super::mode::GameMode;
use super::state::{GameObject, ObjectKind, Session};
use crate::{polar_to_cartesian, rotate};

/// Spawn inset from the canvas edge for in-field spawns (px)
pub const SPAWN_MARGIN: f32 = 40.0;
/// Distance outside the edge where shadows and bubbles appear (px)
pub const OFFSCREEN_SPAWN: f32 = 60.0;
/// Objects further than this beyond the edge (plus radius) are pruned
pub const PRUNE_MARGIN: f32 = 120.0;
/// Most periodic spawns a single tick may catch up on
pub const MAX_SPAWNS_PER_TICK: u32 = 3;
/// Wisps move this much faster than stars
pub const WISP_SPEED_FACTOR: f32 = 2.5;
/// Mist moves this much slower than shadows
pub const MIST_SPEED_FACTOR: f32 = 0.65;
/// Sideways weave of mist (px/s)
pub const MIST_WEAVE: f32 = 40.0;
/// Max heading change of wandering stars (rad/s)
pub const WANDER_TURN_RATE: f32 = 0.8;
/// Breathing amplitude as a fraction of base radius
pub const BREATH_AMPLITUDE: f32 = 0.15;
/// Pulse animation speed (rad/s)
pub const PULSE_RATE: f32 = 2.4;

const FADE_IN_SECS: f32 = 0.5;
const FADE_OUT_SECS: f32 = 1.0;

/// Create the fixed initial set for the session's mode
pub fn populate_initial(session: &mut Session) {
    match session.mode() {
        GameMode::Sequence => spawn_target_ring(session),
        GameMode::MistClear => spawn_core(session),
        GameMode::Adventure | GameMode::Breathing => {}
    }
}

/// Place `sequence_length` targets on a ring, "1" at the top, clockwise
fn spawn_target_ring(session: &mut Session) {
    let n = session.config.target_count();
    let center = session.center();
    let ring = session.bounds.min_element() * session.config.ring_fraction;
    let radius = session.config.radius_range.0;

    for i in 0..n {
        // Screen y grows downward, so -PI/2 is the top and +angle is clockwise
        let theta = -FRAC_PI_2 + i as f32 * TAU / n as f32;
        let id = session.next_object_id(ObjectKind::Target);
        let mut target = GameObject::new(id, ObjectKind::Target, center + polar_to_cartesian(ring, theta), radius);
        target.label = Some((i + 1).to_string());
        target.set_progress(0.0);
        target.pulse = i as f32 * 0.7;
        session.objects.push(target);
    }
    log::debug!("Placed {} sequence targets on ring r={:.0}", n, ring);
}

fn spawn_core(session: &mut Session) {
    let id = session.next_object_id(ObjectKind::Core);
    let mut core = GameObject::new(id, ObjectKind::Core, session.center(), session.config.core_radius);
    core.set_progress(session.config.initial_health as f32 / crate::consts::MAX_HEALTH as f32);
    session.objects.push(core);
}

/// Periodic spawning. Returns how many objects were created.
pub fn spawn(session: &mut Session, dt: f32) -> u32 {
    let interval = session.config.spawn_interval;
    if interval <= 0.0 {
        return 0;
    }

    session.spawn_timer += dt;
    let mut spawned = 0;
    let mut attempts = 0;
    while session.spawn_timer >= interval && attempts < MAX_SPAWNS_PER_TICK {
        session.spawn_timer -= interval;
        attempts += 1;
        if session.budget_count() >= session.config.max_live_objects {
            continue;
        }
        let obj = match session.mode() {
            GameMode::Adventure => new_star(session),
            GameMode::MistClear => new_darkness(session),
            GameMode::Breathing => new_bubble(session),
            GameMode::Sequence => continue,
        };
        log::debug!("Spawned {} at ({:.0}, {:.0})", obj.id, obj.pos.x, obj.pos.y);
        session.objects.push(obj);
        spawned += 1;
    }
    // Drop backlog we refused to catch up on
    if attempts == MAX_SPAWNS_PER_TICK {
        session.spawn_timer = session.spawn_timer.min(interval);
    }
    spawned
}

fn random_radius(session: &mut Session) -> f32 {
    let (lo, hi) = session.config.radius_range;
    if hi > lo {
        session.rng.random_range(lo..=hi)
    } else {
        lo
    }
}

fn random_heading(session: &mut Session) -> Vec2 {
    let theta = session.rng.random_range(0.0..TAU);
    polar_to_cartesian(1.0, theta)
}

fn new_star(session: &mut Session) -> GameObject {
    let bonus = session.config.bonus_chance > 0.0
        && session.rng.random_bool(session.config.bonus_chance.min(1.0) as f64);
    let kind = if bonus { ObjectKind::Wisp } else { ObjectKind::Star };

    let margin_x = SPAWN_MARGIN.min(session.bounds.x * 0.25);
    let margin_y = SPAWN_MARGIN.min(session.bounds.y * 0.25);
    let x = session.rng.random_range(margin_x..=session.bounds.x - margin_x);
    let y = session.rng.random_range(margin_y..=session.bounds.y - margin_y);

    let mut radius = random_radius(session);
    let mut speed = session.config.object_speed;
    if bonus {
        radius *= 0.7;
        speed *= WISP_SPEED_FACTOR;
    }

    let id = session.next_object_id(kind);
    let mut star = GameObject::new(id, kind, Vec2::new(x, y), radius);
    star.vel = random_heading(session) * speed;
    star.opacity = 0.0;
    star.pulse = session.rng.random_range(0.0..TAU);
    star
}

/// Shadow or mist, just outside a random edge, aimed at the core
fn new_darkness(session: &mut Session) -> GameObject {
    let bonus = session.config.bonus_chance > 0.0
        && session.rng.random_bool(session.config.bonus_chance.min(1.0) as f64);
    let kind = if bonus { ObjectKind::Mist } else { ObjectKind::Shadow };

    let (w, h) = (session.bounds.x, session.bounds.y);
    let along = session.rng.random_range(0.0..=1.0f32);
    let pos = match session.rng.random_range(0..4u8) {
        0 => Vec2::new(along * w, -OFFSCREEN_SPAWN),
        1 => Vec2::new(w + OFFSCREEN_SPAWN, along * h),
        2 => Vec2::new(along * w, h + OFFSCREEN_SPAWN),
        _ => Vec2::new(-OFFSCREEN_SPAWN, along * h),
    };

    let mut radius = random_radius(session);
    let mut speed = session.config.object_speed;
    if kind == ObjectKind::Mist {
        radius *= 0.7;
        speed *= MIST_SPEED_FACTOR;
    }

    let target = session.core().map(|c| c.pos).unwrap_or_else(|| session.center());
    let id = session.next_object_id(kind);
    let mut obj = GameObject::new(id, kind, pos, radius);
    obj.vel = (target - pos).normalize_or_zero() * speed;
    obj.pulse = session.rng.random_range(0.0..TAU);
    obj.opacity = if kind == ObjectKind::Mist { 0.6 } else { 0.9 };
    obj
}

fn new_bubble(session: &mut Session) -> GameObject {
    let margin = SPAWN_MARGIN.min(session.bounds.x * 0.25);
    let x = session.rng.random_range(margin..=session.bounds.x - margin);
    let pos = Vec2::new(x, session.bounds.y + OFFSCREEN_SPAWN);
    let radius = random_radius(session);
    let drift = session.rng.random_range(-0.3..=0.3f32);

    let id = session.next_object_id(ObjectKind::StressBubble);
    let mut bubble = GameObject::new(id, ObjectKind::StressBubble, pos, radius);
    bubble.vel = Vec2::new(drift, -1.0).normalize() * session.config.object_speed;
    bubble.pulse = session.rng.random_range(0.0..TAU);
    bubble.opacity = 0.8;
    bubble
}

/// Burst of decorative fragments from a cleared shadow or mist
pub fn spawn_fragments(session: &mut Session, origin: Vec2, count: u32) {
    let speed = session.config.fragment_speed;
    for i in 0..count {
        let base = i as f32 * TAU / count.max(1) as f32;
        let jitter = session.rng.random_range(-0.4..=0.4f32);
        let radius = session.rng.random_range(3.0..=6.0f32);
        let id = session.next_object_id(ObjectKind::Fragment);
        let mut frag = GameObject::new(id, ObjectKind::Fragment, origin, radius);
        frag.vel = polar_to_cartesian(speed, base + jitter);
        session.objects.push(frag);
    }
}

/// Advance every live object by `dt`
pub fn advance(session: &mut Session, dt: f32) {
    let cfg = &session.config;
    let core_pos = session
        .objects
        .iter()
        .find(|o| o.kind == ObjectKind::Core)
        .map(|c| c.pos)
        .unwrap_or(session.bounds * 0.5);

    for obj in session.objects.iter_mut() {
        if obj.is_dead() {
            continue;
        }
        obj.age += dt;
        obj.pulse = (obj.pulse + PULSE_RATE * dt) % TAU;

        match obj.kind {
            ObjectKind::Star | ObjectKind::Wisp => {
                let turn = session.rng.random_range(-1.0..=1.0f32) * WANDER_TURN_RATE * dt;
                obj.vel = rotate(obj.vel, turn);
                obj.pos += obj.vel * dt;
                obj.opacity = lifetime_fade(obj.age, cfg.max_age);
            }
            ObjectKind::Shadow | ObjectKind::Mist => {
                // Re-aim every tick so darkness always homes on the core
                let speed = obj.vel.length();
                let dir = (core_pos - obj.pos).normalize_or_zero();
                obj.vel = dir * speed;
                obj.pos += obj.vel * dt;
                if obj.kind == ObjectKind::Mist {
                    let side = Vec2::new(-dir.y, dir.x);
                    obj.pos += side * obj.pulse.sin() * MIST_WEAVE * dt;
                }
            }
            ObjectKind::StressBubble => {
                obj.pos += obj.vel * dt;
                let phase = TAU * obj.age / cfg.breath_period.max(0.1);
                obj.radius = obj.base_radius * (1.0 + BREATH_AMPLITUDE * phase.sin());
                obj.opacity = 0.8 * lifetime_fade(obj.age, cfg.max_age);
            }
            ObjectKind::Fragment => {
                obj.pos += obj.vel * dt;
                obj.vel *= 0.97;
                obj.radius -= cfg.fragment_shrink * dt;
                obj.opacity = (obj.radius / obj.base_radius).clamp(0.0, 1.0);
            }
            ObjectKind::Target | ObjectKind::Core => {}
        }
    }
}

/// Opacity ramp: fade in after spawn, fade out before expiry
fn lifetime_fade(age: f32, max_age: Option<f32>) -> f32 {
    let fade_in = (age / FADE_IN_SECS).min(1.0);
    let fade_out = match max_age {
        Some(max) => ((max - age) / FADE_OUT_SECS).clamp(0.0, 1.0),
        None => 1.0,
    };
    fade_in.min(fade_out)
}

/// Whether an object must be removed at this tick boundary
pub fn should_prune(obj: &GameObject, bounds: Vec2, max_age: Option<f32>) -> bool {
    if obj.kind == ObjectKind::Core {
        return false;
    }
    if obj.is_dead() {
        return true;
    }
    let reach = PRUNE_MARGIN + obj.radius;
    let outside = obj.pos.x < -reach
        || obj.pos.y < -reach
        || obj.pos.x > bounds.x + reach
        || obj.pos.y > bounds.y + reach;
    if outside {
        return true;
    }
    let expires = matches!(
        obj.kind,
        ObjectKind::Star | ObjectKind::Wisp | ObjectKind::StressBubble
    );
    expires && max_age.is_some_and(|max| obj.age > max)
}

/// Remove everything matching a removal predicate. Returns the count removed.
pub fn prune(session: &mut Session) -> usize {
    let before = session.objects.len();
    let bounds = session.bounds;
    let max_age = session.config.max_age;
    let missed = session.objects.iter().any(|o| {
        matches!(o.kind, ObjectKind::Star | ObjectKind::Wisp)
            && !o.is_cleared
            && should_prune(o, bounds, max_age)
    });
    // A star that got away breaks the collection chain
    if missed {
        session.chain = 0;
    }
    session.objects.retain(|o| !should_prune(o, bounds, max_age));
    before - session.objects.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::ModeConfig;

    fn session(config: ModeConfig) -> Session {
        let mut s = Session::new(config, 42, Vec2::new(1280.0, 720.0));
        populate_initial(&mut s);
        s
    }

    #[test]
    fn test_sequence_ring_labels() {
        let s = session(ModeConfig::sequence());
        let labels: Vec<u32> = s.objects.iter().filter_map(|o| o.sequence_index()).collect();
        assert_eq!(labels, vec![1, 2, 3, 4, 5, 6]);
        // "1" sits straight above the centre
        let first = &s.objects[0];
        assert!((first.pos.x - 640.0).abs() < 0.01);
        assert!(first.pos.y < 360.0);
    }

    #[test]
    fn test_escaped_star_breaks_chain() {
        let mut s = session(ModeConfig::adventure());
        s.chain = 3;
        let id = s.next_object_id(ObjectKind::Star);
        let mut star = GameObject::new(id, ObjectKind::Star, Vec2::new(300.0, 300.0), 15.0);
        star.age = 9.0;
        s.objects.push(star);
        assert_eq!(prune(&mut s), 1);
        assert_eq!(s.chain, 0);
    }

    #[test]
    fn test_collected_star_keeps_chain() {
        let mut s = session(ModeConfig::adventure());
        s.chain = 3;
        let id = s.next_object_id(ObjectKind::Star);
        let mut star = GameObject::new(id, ObjectKind::Star, Vec2::new(300.0, 300.0), 15.0);
        star.is_cleared = true;
        s.objects.push(star);
        assert_eq!(prune(&mut s), 1);
        assert_eq!(s.chain, 3);
    }

    #[test]
    fn test_sequence_never_spawns_more() {
        let mut s = session(ModeConfig::sequence());
        for _ in 0..600 {
            spawn(&mut s, 1.0 / 60.0);
        }
        assert_eq!(s.objects.len(), 6);
    }

    #[test]
    fn test_mist_clear_single_core_at_center() {
        let s = session(ModeConfig::mist_clear());
        let cores: Vec<_> = s.objects.iter().filter(|o| o.kind == ObjectKind::Core).collect();
        assert_eq!(cores.len(), 1);
        assert_eq!(cores[0].pos, Vec2::new(640.0, 360.0));
        assert_eq!(cores[0].progress, Some(1.0));
    }

    #[test]
    fn test_spawn_rate_is_fixed() {
        let mut s = session(ModeConfig::adventure());
        // 0.5 s interval: 2 s in quarter-second steps spawns 4
        for _ in 0..8 {
            spawn(&mut s, 0.25);
        }
        assert_eq!(s.objects.len(), 4);
    }

    #[test]
    fn test_budget_caps_spawns() {
        let mut cfg = ModeConfig::adventure();
        cfg.max_live_objects = 3;
        cfg.spawn_interval = 0.1;
        let mut s = session(cfg);
        for _ in 0..300 {
            spawn(&mut s, 1.0 / 60.0);
        }
        assert_eq!(s.budget_count(), 3);
    }

    #[test]
    fn test_darkness_moves_toward_core() {
        let mut s = session(ModeConfig::mist_clear());
        spawn(&mut s, 1.0);
        let idx = s.objects.iter().position(|o| o.kind.is_darkness()).unwrap();
        let core = s.center();
        let before = s.objects[idx].pos.distance(core);
        for _ in 0..30 {
            advance(&mut s, 1.0 / 60.0);
        }
        assert!(s.objects[idx].pos.distance(core) < before);
    }

    #[test]
    fn test_fragments_shrink_and_prune() {
        let mut s = session(ModeConfig::mist_clear());
        spawn_fragments(&mut s, Vec2::new(300.0, 300.0), 5);
        assert_eq!(s.objects.len(), 6);
        for _ in 0..60 {
            advance(&mut s, 1.0 / 60.0);
            prune(&mut s);
        }
        assert_eq!(s.objects.len(), 1, "only the core survives");
    }

    #[test]
    fn test_stars_expire() {
        let mut cfg = ModeConfig::adventure();
        cfg.object_speed = 0.0;
        let mut s = session(cfg);
        spawn(&mut s, 0.5);
        assert_eq!(s.objects.len(), 1);
        for _ in 0..(9 * 60) {
            advance(&mut s, 1.0 / 60.0);
        }
        assert_eq!(prune(&mut s), 1);
    }

    #[test]
    fn test_core_never_pruned() {
        let mut core = GameObject::new("core-1".into(), ObjectKind::Core, Vec2::splat(-1000.0), 10.0);
        core.set_progress(0.0);
        assert!(!should_prune(&core, Vec2::new(100.0, 100.0), Some(1.0)));
    }

    #[test]
    fn test_lifetime_fade() {
        assert_eq!(lifetime_fade(0.0, Some(8.0)), 0.0);
        assert_eq!(lifetime_fade(2.0, Some(8.0)), 1.0);
        assert!(lifetime_fade(7.5, Some(8.0)) < 1.0);
    }
}
