//! Canvas 2D backend

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scene::DrawCmd;

/// Replay a draw list. Canvas calls that fail are logged and skipped so a
/// single bad primitive never stalls the frame.
pub fn draw(ctx: &CanvasRenderingContext2d, width: f64, height: f64, cmds: &[DrawCmd]) {
    for cmd in cmds {
        if let Err(e) = draw_one(ctx, width, height, cmd) {
            log::warn!("Canvas draw failed: {e:?}");
        }
    }
    ctx.set_global_alpha(1.0);
}

fn draw_one(
    ctx: &CanvasRenderingContext2d,
    width: f64,
    height: f64,
    cmd: &DrawCmd,
) -> Result<(), JsValue> {
    match cmd {
        DrawCmd::Clear { color } => {
            ctx.set_global_alpha(1.0);
            ctx.set_fill_style_str(color);
            ctx.fill_rect(0.0, 0.0, width, height);
        }
        DrawCmd::Circle {
            center,
            radius,
            color,
            alpha,
            glow,
        } => {
            let (x, y) = (center.x as f64, center.y as f64);
            ctx.set_global_alpha(*alpha as f64);
            if *glow > *radius {
                let gradient = ctx.create_radial_gradient(x, y, *radius as f64 * 0.5, x, y, *glow as f64)?;
                gradient.add_color_stop(0.0, color)?;
                gradient.add_color_stop(1.0, "rgba(0, 0, 0, 0)")?;
                ctx.set_fill_style_canvas_gradient(&gradient);
                ctx.begin_path();
                ctx.arc(x, y, *glow as f64, 0.0, TAU)?;
                ctx.fill();
            }
            ctx.set_fill_style_str(color);
            ctx.begin_path();
            ctx.arc(x, y, *radius as f64, 0.0, TAU)?;
            ctx.fill();
        }
        DrawCmd::Arc {
            center,
            radius,
            start,
            sweep,
            width: line_width,
            color,
            alpha,
        } => {
            ctx.set_global_alpha(*alpha as f64);
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*line_width as f64);
            ctx.set_line_cap("round");
            ctx.begin_path();
            ctx.arc(
                center.x as f64,
                center.y as f64,
                *radius as f64,
                *start as f64,
                (*start + *sweep) as f64,
            )?;
            ctx.stroke();
        }
        DrawCmd::Line {
            from,
            to,
            width: line_width,
            color,
            alpha,
        } => {
            ctx.set_global_alpha(*alpha as f64);
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*line_width as f64);
            ctx.begin_path();
            ctx.move_to(from.x as f64, from.y as f64);
            ctx.line_to(to.x as f64, to.y as f64);
            ctx.stroke();
        }
        DrawCmd::Text {
            pos,
            text,
            size,
            color,
        } => {
            ctx.set_global_alpha(1.0);
            ctx.set_fill_style_str(color);
            ctx.set_font(&format!("bold {}px sans-serif", size.round()));
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.fill_text(text, pos.x as f64, pos.y as f64)?;
        }
    }
    Ok(())
}
