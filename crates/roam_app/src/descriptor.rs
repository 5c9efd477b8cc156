//! Registration descriptors for systems and renderers.
//!
//! Wiring is explicit: a system declares, at registration time, the bundle
//! shapes it intends to query. The driver validates and resolves them
//! immediately, so a malformed shape aborts startup instead of a tick.

use roam_ecs::{Bundle, EcsError, Shape};

/// Describes a system (or renderer) to be registered: its name plus the
/// bundle shapes it queries.
#[derive(Debug, Clone)]
pub struct SystemDescriptor {
    name: String,
    shapes: Vec<fn() -> Result<Shape, EcsError>>,
}

impl SystemDescriptor {
    /// Describe a system by name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shapes: Vec::new(),
        }
    }

    /// Declare a bundle shape this system queries.
    #[must_use]
    pub fn shape<B: Bundle>(mut self) -> Self {
        self.shapes.push(Shape::of::<B>);
        self
    }

    /// The system's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume the descriptor, returning its name.
    pub(crate) fn into_name(self) -> String {
        self.name
    }

    /// Validate every declared shape, in declaration order.
    pub(crate) fn validate(&self) -> Result<Vec<Shape>, EcsError> {
        self.shapes.iter().map(|shape_of| shape_of()).collect()
    }
}
