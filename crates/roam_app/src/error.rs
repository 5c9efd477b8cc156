//! Driver-layer error types.

use roam_ecs::EcsError;

/// Errors surfaced by registration and the tick/frame driver.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A declared shape failed validation at registration time.
    ///
    /// Registration errors are configuration errors: the application should
    /// abort startup rather than run with a system it could not wire.
    #[error("unable to add `{name}`: {source}")]
    Register {
        /// Name of the system or renderer being registered.
        name: String,
        /// The underlying shape failure.
        source: EcsError,
    },

    /// A system or renderer failed while running.
    #[error("`{name}` failed: {source}")]
    System {
        /// Name of the failing system or renderer.
        name: String,
        /// The underlying storage failure.
        source: EcsError,
    },

    /// End-of-tick reconciliation rejected a queued bundle.
    ///
    /// The tick is aborted; entities reconciled before the failure remain
    /// (insertion is atomic per identity) and the queue is already cleared.
    #[error("reconciliation of `{bundle}` failed: {source}")]
    Reconcile {
        /// Type name of the rejected bundle.
        bundle: &'static str,
        /// The underlying storage failure.
        source: EcsError,
    },
}
