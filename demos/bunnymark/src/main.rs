//! Headless bunnymark — drives the roam engine for a fixed number of ticks.
//!
//! Spawn waves are queued by systems, reconciled by the engine at the end of
//! each tick, and drawn into a character-cell canvas each frame. Pass a JSON
//! settings file as the first argument to override the defaults:
//!
//! ```text
//! bunnymark settings.json
//! RUST_LOG=bunnymark=debug bunnymark
//! ```

mod canvas;
mod component;
mod render;
mod settings;
mod system;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use roam_app::{App, SystemDescriptor};

use crate::canvas::Canvas;
use crate::component::{Bouncing, Drawable, Falling, Kinematics};
use crate::settings::{DemoResources, Settings};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bunnymark=info".parse()?))
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(Path::new(&path))
            .with_context(|| format!("loading settings from `{path}`"))?,
        None => Settings::default(),
    };
    info!(?settings, "bunnymark starting");

    let ticks = settings.ticks;
    let (width, height) = (settings.width, settings.height);
    let mut app: App<DemoResources, Canvas> = App::new(DemoResources::new(settings));
    app.layout(width, height);

    app.add_startup_system(SystemDescriptor::new("seed"), system::seed)?;
    app.add_system(
        SystemDescriptor::new("velocity").shape::<Kinematics>(),
        system::velocity,
    )?;
    app.add_system(
        SystemDescriptor::new("gravity").shape::<Falling>(),
        system::gravity,
    )?;
    app.add_system(
        SystemDescriptor::new("bounce").shape::<Bouncing>(),
        system::bounce,
    )?;
    app.add_system(SystemDescriptor::new("spawn"), system::spawn)?;
    app.add_system(SystemDescriptor::new("metrics"), system::metrics)?;

    app.add_renderer(SystemDescriptor::new("background"), render::background)?;
    app.add_renderer(
        SystemDescriptor::new("bunnies").shape::<Drawable>(),
        render::bunnies,
    )?;
    app.add_renderer(SystemDescriptor::new("overlay"), render::overlay)?;

    let mut canvas = Canvas::new(width as usize, height as usize);
    for _ in 0..ticks {
        app.update().context("tick failed")?;
        app.draw(&mut canvas).context("frame failed")?;
    }

    println!("{canvas}");
    info!(
        ticks,
        entities = app.frame().entities,
        peak = app.resources().metrics.peak_entities,
        waves = app.resources().metrics.waves,
        "bunnymark finished"
    );
    Ok(())
}
