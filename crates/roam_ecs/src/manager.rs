//! The deferred spawn queue.
//!
//! Systems never insert into column storage directly: creation requests
//! buffer here, and the tick driver reconciles them after every system has
//! run. A tick's queries therefore observe a stable store throughout — a
//! freshly spawned entity can never be visited zero or two times depending
//! on where the iteration happened to be.

use crate::bundle::{Bundle, DynBundle};

/// Buffers bundle-creation requests issued while systems run.
///
/// Created empty at startup, appended to during a tick by any system, and
/// drained by the tick driver at end of tick.
#[derive(Default)]
pub struct Manager {
    queue: Vec<Box<dyn DynBundle>>,
}

impl Manager {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `bundle` for creation at the end of the current tick.
    ///
    /// Nothing is validated here; shape problems surface at reconciliation.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) {
        self.queue.push(Box::new(bundle));
    }

    /// Number of requests waiting for reconciliation.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Hand over the pending requests in enqueue order, leaving the queue
    /// empty. Driven by the tick driver, never by systems.
    pub fn drain(&mut self) -> Vec<Box<dyn DynBundle>> {
        std::mem::take(&mut self.queue)
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("pending", &self.queue.len())
            .finish()
    }
}
