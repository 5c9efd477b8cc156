//! Renderers for the bunnymark demo.
//!
//! Renderers receive the canvas as the render target alongside the usual
//! context; the engine hands it through without looking at it.

use roam_app::SystemContext;
use roam_ecs::EcsError;

use crate::canvas::Canvas;
use crate::component::Drawable;
use crate::settings::DemoResources;

/// Glyphs cycled through as the hue angle sweeps a full turn.
const HUE_GLYPHS: [char; 4] = ['b', 'd', 'p', 'q'];

/// Blank the canvas before the other renderers draw.
pub fn background(
    _ctx: &mut SystemContext<'_, DemoResources>,
    canvas: &mut Canvas,
) -> Result<(), EcsError> {
    canvas.clear();
    Ok(())
}

/// Draw every bunny at its current position.
pub fn bunnies(
    ctx: &mut SystemContext<'_, DemoResources>,
    canvas: &mut Canvas,
) -> Result<(), EcsError> {
    let colorful = ctx.resources.settings.colorful;
    ctx.query::<Drawable>()?.for_each(|d| {
        let glyph = if colorful {
            hue_glyph(d.hue.value)
        } else {
            d.sprite.glyph
        };
        canvas.plot(d.pos.v.x, d.pos.v.y, glyph);
    })
}

/// Write the status line into the top row.
pub fn overlay(
    ctx: &mut SystemContext<'_, DemoResources>,
    canvas: &mut Canvas,
) -> Result<(), EcsError> {
    let line = format!(
        "tick {}  entities {}  peak {}  {}x{}",
        ctx.frame.tick,
        ctx.frame.entities,
        ctx.resources.metrics.peak_entities,
        ctx.frame.bounds.width,
        ctx.frame.bounds.height,
    );
    canvas.caption(&line);
    Ok(())
}

fn hue_glyph(hue: f64) -> char {
    let turn = (hue / std::f64::consts::TAU).rem_euclid(1.0);
    HUE_GLYPHS[(turn * HUE_GLYPHS.len() as f64) as usize % HUE_GLYPHS.len()]
}
