//! Hand vs. object interaction
//!
//! Proximity is a plain distance test against the hand's palm centre each
//! tick: an object is touched when the hand is within its radius plus the
//! mode's hand radius. There is no swept collision; fast sweeps that skip
//! over an object between two ticks simply miss it.

use glam::Vec2;

use super::mode::{EndReason, GameMode, ModeConfig};
use super::spawn::spawn_fragments;
use super::state::{GameEvent, GameObject, ObjectKind, Session};
use crate::tracking::HandSample;

/// Distance test between the hand and an object
#[inline]
pub fn in_reach(hand: Vec2, obj: &GameObject, hand_radius: f32) -> bool {
    hand.distance(obj.pos) <= obj.radius + hand_radius
}

/// Apply every hand interaction for this tick. All qualifying objects in
/// reach resolve together; there is no single-pick limit.
pub fn resolve(session: &mut Session, hand: &HandSample, events: &mut Vec<GameEvent>) {
    if !hand.is_visible {
        return;
    }

    let cfg = session.config.clone();
    // Deferred to avoid borrowing objects while pushing new ones
    let mut bursts: Vec<Vec2> = Vec::new();

    for obj in session.objects.iter_mut() {
        if obj.is_dead() || !obj.kind.is_interactive() {
            continue;
        }
        if !in_reach(hand.position, obj, cfg.hand_radius) {
            continue;
        }

        let award = match obj.kind {
            ObjectKind::Star => Some((cfg.points, format!("+{}", cfg.points))),
            ObjectKind::Wisp => Some((cfg.bonus_points, format!("+{}", cfg.bonus_points))),
            ObjectKind::Shadow | ObjectKind::Mist => {
                let fast = cfg
                    .fast_gesture_threshold
                    .is_some_and(|t| hand.velocity >= t);
                if !fast {
                    None
                } else if obj.kind == ObjectKind::Mist {
                    bursts.push(obj.pos);
                    Some((cfg.bonus_points, format!("+{}", cfg.bonus_points)))
                } else {
                    bursts.push(obj.pos);
                    Some((cfg.points, "Purified".to_string()))
                }
            }
            ObjectKind::StressBubble => {
                let calm = cfg.calm_threshold.is_none_or(|t| hand.velocity <= t);
                calm.then(|| (cfg.points, "Breathe".to_string()))
            }
            ObjectKind::Target => {
                // Wrong order cannot light the sky: no score, no reset
                if obj.sequence_index() == Some(session.expected_label) {
                    obj.set_progress(1.0);
                    session.expected_label += 1;
                    events.push(GameEvent::SequenceAdvanced {
                        next: session.expected_label,
                    });
                    let label = obj.label.clone().unwrap_or_default();
                    Some((cfg.points, format!("Star {label}")))
                } else {
                    None
                }
            }
            ObjectKind::Core | ObjectKind::Fragment => None,
        };

        if let Some((points, label)) = award {
            obj.is_cleared = true;
            session.score += points as u64;
            session.collected += 1;
            session.chain += 1;
            events.push(GameEvent::Collected {
                kind: obj.kind,
                points,
                label: Some(label),
                pos: obj.pos,
                chain: session.chain,
            });
        }
    }

    for pos in bursts {
        spawn_fragments(session, pos, cfg.fragments_per_clear);
    }

    check_sequence_complete(session, &cfg, events);
}

/// Award the completion bonus and end the session once every target is lit
fn check_sequence_complete(session: &mut Session, cfg: &ModeConfig, events: &mut Vec<GameEvent>) {
    if session.ended.is_some() || session.mode() != GameMode::Sequence {
        return;
    }
    if session.expected_label <= cfg.target_count() {
        return;
    }
    session.score += cfg.bonus_points as u64;
    events.push(GameEvent::Collected {
        kind: ObjectKind::Target,
        points: cfg.bonus_points,
        label: Some("The sky is lit!".to_string()),
        pos: session.center(),
        chain: session.chain,
    });
    session.ended = Some(EndReason::SequenceComplete);
    events.push(GameEvent::SessionEnded(EndReason::SequenceComplete));
    log::info!("Sequence complete, score {}", session.score);
}

/// Darkness that reached the core uncontested damages it. Runs after
/// `resolve`, so anything swept this tick is already cleared.
pub fn resolve_core_arrivals(session: &mut Session, events: &mut Vec<GameEvent>) {
    if session.ended.is_some() {
        return;
    }
    let Some(core) = session.core() else {
        return;
    };
    let (core_pos, core_radius) = (core.pos, core.radius);
    let damage = session.config.core_damage;

    let mut hits = 0u32;
    for obj in session.objects.iter_mut() {
        if obj.is_dead() || !obj.kind.is_darkness() {
            continue;
        }
        if obj.pos.distance(core_pos) <= core_radius + obj.radius * 0.5 {
            obj.is_cleared = true;
            hits += 1;
        }
    }

    for _ in 0..hits {
        let Some(core) = session.core_mut() else {
            return;
        };
        let progress = core.progress.unwrap_or(1.0) - damage;
        core.set_progress(progress);
        let health = ModeConfig::health_from_progress(progress);
        if health == 0 {
            core.set_progress(0.0);
        }
        session.chain = 0;
        events.push(GameEvent::HealthChanged(health));

        if health == 0 {
            session.ended = Some(EndReason::CoreExtinguished);
            events.push(GameEvent::SessionEnded(EndReason::CoreExtinguished));
            log::info!("Core extinguished after {:.1}s", session.elapsed);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::mode::ModeConfig;
    use crate::sim::spawn::populate_initial;

    fn session(config: ModeConfig) -> Session {
        let mut s = Session::new(config, 7, Vec2::new(1280.0, 720.0));
        populate_initial(&mut s);
        s
    }

    fn place(s: &mut Session, kind: ObjectKind, pos: Vec2, radius: f32) -> usize {
        let id = s.next_object_id(kind);
        s.objects.push(GameObject::new(id, kind, pos, radius));
        s.objects.len() - 1
    }

    fn collected(events: &[GameEvent]) -> u32 {
        events
            .iter()
            .map(|e| match e {
                GameEvent::Collected { points, .. } => *points,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_star_collected_in_reach() {
        let mut s = session(ModeConfig::adventure());
        let i = place(&mut s, ObjectKind::Star, Vec2::new(100.0, 100.0), 20.0);
        let mut events = Vec::new();
        resolve(&mut s, &HandSample::at(Vec2::new(100.0, 100.0), 0.0), &mut events);
        assert!(s.objects[i].is_cleared);
        assert_eq!(collected(&events), 10);
    }

    #[test]
    fn test_star_out_of_reach() {
        let mut s = session(ModeConfig::adventure());
        let i = place(&mut s, ObjectKind::Star, Vec2::new(100.0, 100.0), 20.0);
        let mut events = Vec::new();
        // 20 + 40 = 60 reach
        resolve(&mut s, &HandSample::at(Vec2::new(161.0, 100.0), 0.0), &mut events);
        assert!(!s.objects[i].is_cleared);
        assert!(events.is_empty());
    }

    #[test]
    fn test_hidden_hand_does_nothing() {
        let mut s = session(ModeConfig::adventure());
        place(&mut s, ObjectKind::Star, Vec2::new(100.0, 100.0), 20.0);
        let mut hand = HandSample::at(Vec2::new(100.0, 100.0), 0.0);
        hand.is_visible = false;
        let mut events = Vec::new();
        resolve(&mut s, &hand, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_sweep_collects_all_in_reach() {
        let mut s = session(ModeConfig::adventure());
        place(&mut s, ObjectKind::Star, Vec2::new(100.0, 100.0), 15.0);
        place(&mut s, ObjectKind::Star, Vec2::new(120.0, 110.0), 15.0);
        place(&mut s, ObjectKind::Wisp, Vec2::new(90.0, 80.0), 10.0);
        let mut events = Vec::new();
        resolve(&mut s, &HandSample::at(Vec2::new(100.0, 100.0), 0.0), &mut events);
        assert_eq!(collected(&events), 10 + 10 + 25);
        assert_eq!(s.chain, 3);
    }

    #[test]
    fn test_sequence_out_of_order_is_noop() {
        let mut s = session(ModeConfig::sequence());
        let third = s.objects[2].pos;
        let mut events = Vec::new();
        resolve(&mut s, &HandSample::at(third, 0.0), &mut events);
        assert!(events.is_empty());
        assert_eq!(s.expected_label, 1);
        assert_eq!(s.objects[2].progress, Some(0.0));

        let first = s.objects[0].pos;
        resolve(&mut s, &HandSample::at(first, 0.0), &mut events);
        assert_eq!(s.expected_label, 2);
        assert_eq!(collected(&events), 20);
        assert!(s.objects[0].is_cleared);
    }

    #[test]
    fn test_sequence_completion_ends_session() {
        let mut s = session(ModeConfig::sequence());
        let positions: Vec<Vec2> = s.objects.iter().map(|o| o.pos).collect();
        let mut events = Vec::new();
        for pos in positions {
            resolve(&mut s, &HandSample::at(pos, 0.0), &mut events);
        }
        assert_eq!(s.expected_label, 7);
        assert_eq!(s.ended, Some(EndReason::SequenceComplete));
        assert_eq!(s.score, 6 * 20 + 50);
    }

    #[test]
    fn test_zero_length_sequence_still_needs_a_touch() {
        let cfg = ModeConfig::from_json(GameMode::Sequence, r#"{"sequence_length": 0}"#).unwrap();
        let mut s = session(cfg);
        assert_eq!(s.objects.len(), 1);

        let mut events = Vec::new();
        resolve(&mut s, &HandSample::at(Vec2::new(5.0, 5.0), 0.0), &mut events);
        assert!(events.is_empty());
        assert_eq!(s.ended, None);
        assert_eq!(s.score, 0);

        let pos = s.objects[0].pos;
        resolve(&mut s, &HandSample::at(pos, 0.0), &mut events);
        assert_eq!(s.ended, Some(EndReason::SequenceComplete));
        assert_eq!(s.score, 70);
    }

    #[test]
    fn test_shadow_needs_fast_gesture() {
        let mut s = session(ModeConfig::mist_clear());
        let i = place(&mut s, ObjectKind::Shadow, Vec2::new(200.0, 200.0), 20.0);
        let hand_pos = Vec2::new(205.0, 200.0);
        let mut events = Vec::new();

        resolve(&mut s, &HandSample::at(hand_pos, 899.0), &mut events);
        assert!(!s.objects[i].is_cleared);
        assert!(events.is_empty());

        resolve(&mut s, &HandSample::at(hand_pos, 900.0), &mut events);
        assert!(s.objects[i].is_cleared);
        assert_eq!(collected(&events), 15);
        let fragments = s.objects.iter().filter(|o| o.kind == ObjectKind::Fragment).count();
        assert_eq!(fragments, 5);
    }

    #[test]
    fn test_core_and_fragments_ignore_hand() {
        let mut s = session(ModeConfig::mist_clear());
        let center = s.center();
        place(&mut s, ObjectKind::Fragment, center, 5.0);
        let mut events = Vec::new();
        resolve(&mut s, &HandSample::at(center, 5000.0), &mut events);
        assert!(events.is_empty());
        assert_eq!(s.core().unwrap().progress, Some(1.0));
    }

    #[test]
    fn test_bubble_needs_calm_touch() {
        let mut s = session(ModeConfig::breathing());
        let i = place(&mut s, ObjectKind::StressBubble, Vec2::new(300.0, 300.0), 30.0);
        let mut events = Vec::new();
        resolve(&mut s, &HandSample::at(Vec2::new(300.0, 300.0), 800.0), &mut events);
        assert!(!s.objects[i].is_cleared);
        resolve(&mut s, &HandSample::at(Vec2::new(300.0, 300.0), 100.0), &mut events);
        assert!(s.objects[i].is_cleared);
    }

    #[test]
    fn test_core_arrival_damages_once() {
        let mut s = session(ModeConfig::mist_clear());
        let center = s.center();
        let i = place(&mut s, ObjectKind::Shadow, center + Vec2::new(50.0, 0.0), 20.0);
        let mut events = Vec::new();
        resolve_core_arrivals(&mut s, &mut events);
        assert!(s.objects[i].is_cleared);
        assert_eq!(events, vec![GameEvent::HealthChanged(90)]);

        // Already consumed; a second pass changes nothing
        events.clear();
        resolve_core_arrivals(&mut s, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_core_extinguished_reports_zero_once() {
        let mut cfg = ModeConfig::mist_clear();
        cfg.core_damage = 0.5;
        let mut s = session(cfg);
        let center = s.center();
        for _ in 0..4 {
            place(&mut s, ObjectKind::Shadow, center, 20.0);
        }
        let mut events = Vec::new();
        resolve_core_arrivals(&mut s, &mut events);
        let zeros = events.iter().filter(|e| **e == GameEvent::HealthChanged(0)).count();
        assert_eq!(zeros, 1);
        assert_eq!(s.ended, Some(EndReason::CoreExtinguished));
        assert!(events.contains(&GameEvent::SessionEnded(EndReason::CoreExtinguished)));
    }
}
