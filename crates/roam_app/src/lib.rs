//! # roam_app
//!
//! The driver that hosts the roam storage core. It owns the column store,
//! the entity allocator, and the spawn queue, and exposes:
//!
//! - Explicit registration of startup systems, per-tick systems, and
//!   renderers via [`SystemDescriptor`] — declared shapes are validated and
//!   resolved at registration time, so wiring errors abort startup.
//! - [`App::update`] — one tick: systems in registration order, then
//!   spawn-queue reconciliation, then the entity-count refresh.
//! - [`App::draw`] — one frame: renderers in registration order against an
//!   opaque render target the engine never inspects.
//!
//! ## Usage
//!
//! ```
//! use roam_app::{App, SystemDescriptor};
//! use roam_ecs::bundle;
//!
//! #[derive(Debug, Clone, Copy)]
//! pub struct Position {
//!     pub x: f64,
//! }
//!
//! bundle! {
//!     #[derive(Debug, Clone)]
//!     pub struct Mover {
//!         pub pos: Position,
//!     }
//! }
//!
//! let mut app: App = App::new(());
//! app.add_startup_system(SystemDescriptor::new("seed"), |ctx| {
//!     ctx.spawn(Mover {
//!         pos: Position { x: 0.0 },
//!     });
//!     Ok(())
//! })
//! .unwrap();
//! app.add_system(SystemDescriptor::new("drift").shape::<Mover>(), |ctx| {
//!     ctx.query::<Mover>()?.for_each(|m| m.pos.x += 1.0)
//! })
//! .unwrap();
//!
//! app.update().unwrap(); // tick 1: seed runs, spawn reconciles at tick end
//! app.update().unwrap(); // tick 2: drift moves the entity
//! assert_eq!(app.frame().entities, 1);
//! ```

pub mod app;
pub mod context;
pub mod descriptor;
pub mod error;

pub use app::App;
pub use context::{Bounds, FrameInfo, SystemContext};
pub use descriptor::SystemDescriptor;
pub use error::AppError;
