//! Per-tick systems for the bunnymark demo.
//!
//! Each system queries a narrow bundle shape rather than the full [`Bunny`],
//! so it touches only the columns it needs.

use glam::DVec2;
use rand::Rng;
use tracing::{debug, info};

use roam_app::SystemContext;
use roam_ecs::EcsError;

use crate::component::{Bouncing, Bunny, Falling, Gravity, Hue, Kinematics, Position, Sprite, Velocity};
use crate::settings::DemoResources;

/// Downward acceleration given to every spawned bunny.
const GRAVITY: f64 = 0.00095;

/// Startup system: queue the first wave so the run starts populated.
pub fn seed(ctx: &mut SystemContext<'_, DemoResources>) -> Result<(), EcsError> {
    queue_wave(ctx);
    Ok(())
}

/// Integrate velocity into position.
pub fn velocity(ctx: &mut SystemContext<'_, DemoResources>) -> Result<(), EcsError> {
    ctx.query::<Kinematics>()?.for_each(|k| {
        k.pos.v += k.vel.v;
    })
}

/// Apply gravity to vertical velocity.
pub fn gravity(ctx: &mut SystemContext<'_, DemoResources>) -> Result<(), EcsError> {
    ctx.query::<Falling>()?.for_each(|f| {
        f.vel.v.y += f.gravity.value;
    })
}

/// Bounce bunnies off the edges of the layout bounds.
pub fn bounce(ctx: &mut SystemContext<'_, DemoResources>) -> Result<(), EcsError> {
    let bounds = ctx.frame.bounds;
    let (sw, sh) = (f64::from(bounds.width), f64::from(bounds.height));
    if sw == 0.0 || sh == 0.0 {
        return Ok(());
    }
    let (mut query, resources) = ctx.query_with::<Bouncing>()?;
    query.for_each(|b| {
        let rel_w = b.sprite.width / sw;
        let rel_h = b.sprite.height / sh;
        if b.pos.v.x + rel_w > 1.0 {
            b.vel.v.x *= -1.0;
            b.pos.v.x = 1.0 - rel_w;
        }
        if b.pos.v.x < 0.0 {
            b.vel.v.x *= -1.0;
            b.pos.v.x = 0.0;
        }
        if b.pos.v.y + rel_h > 1.0 {
            b.vel.v.y *= -0.85;
            b.pos.v.y = 1.0 - rel_h;
            if resources.rng.gen_bool(0.5) {
                b.vel.v.y -= resources.rng.gen_range(0.0..0.009);
            }
        }
        if b.pos.v.y < 0.0 {
            b.vel.v.y = 0.0;
            b.pos.v.y = 0.0;
        }
    })
}

/// Queue a wave of bunnies every `wave_interval` ticks.
pub fn spawn(ctx: &mut SystemContext<'_, DemoResources>) -> Result<(), EcsError> {
    let interval = ctx.resources.settings.wave_interval;
    if interval == 0 || ctx.frame.tick % interval != 0 {
        return Ok(());
    }
    queue_wave(ctx);
    Ok(())
}

/// Track the peak population and report every `metrics_interval` ticks.
pub fn metrics(ctx: &mut SystemContext<'_, DemoResources>) -> Result<(), EcsError> {
    let entities = ctx.frame.entities;
    if entities > ctx.resources.metrics.peak_entities {
        ctx.resources.metrics.peak_entities = entities;
    }
    let every = ctx.resources.settings.metrics_interval;
    if every != 0 && ctx.frame.tick % every == 0 {
        info!(
            tick = ctx.frame.tick,
            entities,
            waves = ctx.resources.metrics.waves,
            "bunnymark metrics"
        );
    }
    Ok(())
}

fn queue_wave(ctx: &mut SystemContext<'_, DemoResources>) {
    let amount = ctx.resources.settings.amount;
    // Waves alternate between the left and right screen edges as the
    // population parity flips.
    let edge = (ctx.frame.entities % 2) as f64;
    for _ in 0..amount {
        let vel = DVec2::new(
            ctx.resources.rng.gen_range(0.0..0.005),
            ctx.resources.rng.gen_range(0.0025..0.005),
        );
        let hue = ctx.resources.rng.gen_range(0.0..std::f64::consts::TAU);
        ctx.spawn(Bunny {
            pos: Position {
                v: DVec2::new(edge, 0.0),
            },
            vel: Velocity { v: vel },
            hue: Hue { value: hue },
            gravity: Gravity { value: GRAVITY },
            sprite: Sprite {
                glyph: 'b',
                width: 1.0,
                height: 1.0,
            },
        });
    }
    ctx.resources.metrics.waves += 1;
    debug!(tick = ctx.frame.tick, queued = amount, "queued bunny wave");
}
