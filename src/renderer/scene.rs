//! Draw list construction
//!
//! Everything here is plain data so the frame layout can be tested natively.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use crate::settings::Settings;
use crate::sim::{GameObject, ObjectKind, Session};
use crate::tracking::{HAND_CONNECTIONS, HandSample};

/// Background fill, a deep night blue
pub const BACKGROUND: &str = "#0b1026";

const CURSOR_COLOR: &str = "#ffffff";
const SKELETON_COLOR: &str = "#7ef0c2";
const RING_TRACK_COLOR: &str = "rgba(255, 255, 255, 0.15)";
const CURSOR_RADIUS: f32 = 14.0;
const HIDDEN_CURSOR_ALPHA: f32 = 0.3;
/// Fraction of the radius the glow halo extends past the body
const GLOW_SCALE: f32 = 1.8;
/// How much the pulse swings the glow, as a fraction of the radius
const PULSE_SWING: f32 = 0.25;

/// One primitive for the 2D backend
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Fill the whole canvas
    Clear { color: &'static str },
    /// Filled disc, optionally with a radial glow reaching `glow` px
    Circle {
        center: Vec2,
        radius: f32,
        color: String,
        alpha: f32,
        glow: f32,
    },
    /// Stroked arc from `start` sweeping `sweep` radians clockwise
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        sweep: f32,
        width: f32,
        color: String,
        alpha: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: &'static str,
        alpha: f32,
    },
    /// Centered text
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        color: &'static str,
    },
}

/// Build the frame. `session` is `None` between games, where only the
/// cursor is drawn.
pub fn build(session: Option<&Session>, hand: &HandSample, settings: &Settings) -> Vec<DrawCmd> {
    let mut cmds = vec![DrawCmd::Clear { color: BACKGROUND }];

    if let Some(session) = session {
        for obj in &session.objects {
            push_object(&mut cmds, obj, settings.reduced_motion);
        }
    }

    push_hand(&mut cmds, hand, settings.show_skeleton);
    cmds
}

fn glow_for(obj: &GameObject, reduced_motion: bool) -> f32 {
    let base = obj.radius * GLOW_SCALE;
    if reduced_motion {
        base
    } else {
        base + obj.radius * PULSE_SWING * obj.pulse.sin()
    }
}

fn push_object(cmds: &mut Vec<DrawCmd>, obj: &GameObject, reduced_motion: bool) {
    if obj.radius <= 0.0 || obj.opacity <= 0.0 {
        return;
    }

    // Darkness has no halo
    let glow = if obj.kind.is_darkness() {
        0.0
    } else {
        glow_for(obj, reduced_motion)
    };

    cmds.push(DrawCmd::Circle {
        center: obj.pos,
        radius: obj.radius,
        color: obj.color.clone(),
        alpha: obj.opacity,
        glow,
    });

    match obj.kind {
        ObjectKind::Target => {
            let progress = obj.progress.unwrap_or(0.0);
            push_ring(cmds, obj, obj.radius + 6.0, 3.0, progress);
            if let Some(label) = &obj.label {
                cmds.push(DrawCmd::Text {
                    pos: obj.pos,
                    text: label.clone(),
                    size: (obj.radius * 0.9).max(12.0),
                    color: BACKGROUND,
                });
            }
        }
        ObjectKind::Core => {
            let progress = obj.progress.unwrap_or(1.0);
            push_ring(cmds, obj, obj.radius + 10.0, 6.0, progress);
        }
        _ => {}
    }
}

/// Track plus a progress arc starting at 12 o'clock
fn push_ring(cmds: &mut Vec<DrawCmd>, obj: &GameObject, radius: f32, width: f32, progress: f32) {
    cmds.push(DrawCmd::Arc {
        center: obj.pos,
        radius,
        start: 0.0,
        sweep: TAU,
        width,
        color: RING_TRACK_COLOR.to_string(),
        alpha: 1.0,
    });
    if progress > 0.0 {
        cmds.push(DrawCmd::Arc {
            center: obj.pos,
            radius,
            start: -PI / 2.0,
            sweep: TAU * progress.clamp(0.0, 1.0),
            width,
            color: obj.color.clone(),
            alpha: obj.opacity,
        });
    }
}

fn push_hand(cmds: &mut Vec<DrawCmd>, hand: &HandSample, show_skeleton: bool) {
    if hand.position == Vec2::ZERO && !hand.is_visible {
        // Never seen a hand yet
        return;
    }
    let alpha = if hand.is_visible { 1.0 } else { HIDDEN_CURSOR_ALPHA };

    if show_skeleton && hand.is_visible && hand.landmarks.len() == crate::consts::LANDMARK_COUNT {
        for &(a, b) in HAND_CONNECTIONS.iter() {
            cmds.push(DrawCmd::Line {
                from: hand.landmarks[a],
                to: hand.landmarks[b],
                width: 2.0,
                color: SKELETON_COLOR,
                alpha: 0.6,
            });
        }
    }

    cmds.push(DrawCmd::Circle {
        center: hand.position,
        radius: CURSOR_RADIUS,
        color: CURSOR_COLOR.to_string(),
        alpha,
        glow: if hand.is_visible { CURSOR_RADIUS * 2.0 } else { 0.0 },
    });
}
