//! Per-tick execution context provided to systems and renderers.

use roam_ecs::{Bundle, ColumnStorage, EcsError, Manager, Query};

/// Engine-maintained frame information, refreshed by the driver and read by
/// systems and renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInfo {
    /// The current tick counter (0 before the first tick).
    pub tick: u64,
    /// Number of known entities as of the most recent reconciliation.
    pub entities: usize,
    /// Logical output bounds, as last reported via [`App::layout`].
    ///
    /// [`App::layout`]: crate::App::layout
    pub bounds: Bounds,
}

/// Logical output bounds in whatever units the host surface uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    /// Horizontal extent.
    pub width: u32,
    /// Vertical extent.
    pub height: u32,
}

/// Context handed to each system on each tick (and to each renderer on each
/// frame, alongside the render target).
///
/// Gives access to typed queries over the store, deferred spawning, the
/// application's resource slots, and the engine's [`FrameInfo`].
pub struct SystemContext<'a, R> {
    storage: &'a mut ColumnStorage,
    manager: &'a mut Manager,
    /// The application's typed resource slots.
    pub resources: &'a mut R,
    /// Frame information as of the start of this tick.
    pub frame: FrameInfo,
}

impl<'a, R> SystemContext<'a, R> {
    pub(crate) fn new(
        storage: &'a mut ColumnStorage,
        manager: &'a mut Manager,
        resources: &'a mut R,
        frame: FrameInfo,
    ) -> Self {
        Self {
            storage,
            manager,
            resources,
            frame,
        }
    }

    /// Open a typed query over the current store.
    ///
    /// The query borrows the store for its lifetime, so queries within one
    /// system run strictly one after another and each observes every earlier
    /// copy-out.
    pub fn query<B: Bundle>(&mut self) -> Result<Query<'_, B>, EcsError> {
        Query::new(&mut *self.storage)
    }

    /// Open a typed query and borrow the resource slots alongside it, for
    /// visit closures that need both at once.
    pub fn query_with<B: Bundle>(&mut self) -> Result<(Query<'_, B>, &mut R), EcsError> {
        Ok((Query::new(&mut *self.storage)?, &mut *self.resources))
    }

    /// Queue `bundle` for creation at the end of this tick.
    ///
    /// The new entity is not visible to any query until the next tick.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) {
        self.manager.spawn(bundle);
    }

    /// Number of known entities as of the most recent reconciliation.
    #[must_use]
    pub fn entities(&self) -> usize {
        self.frame.entities
    }
}
