//! Storage-layer error types.

use crate::entity::Entity;

/// Errors surfaced by bundle insertion and query construction.
///
/// All failures are reported synchronously to the immediate caller; the
/// storage layer never retries and never commits a partial insertion.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// A bundle, query shape, or stored value does not decompose into
    /// distinct, well-typed component columns.
    ///
    /// Surfaces at registration (a declared shape is rejected), at query
    /// construction, or when end-of-tick reconciliation meets a queued
    /// bundle whose field list is inconsistent.
    #[error("invalid bundle shape `{bundle}`: {reason}")]
    InvalidBundleShape {
        /// Type name of the offending bundle, shape, or value.
        bundle: &'static str,
        /// Why the shape was rejected.
        reason: String,
    },

    /// A column already holds a value for the entity being added.
    ///
    /// Columns are append-only and identities are allocated fresh per spawned
    /// bundle, so this cannot occur through the spawn queue. Hitting it means
    /// a hand-written [`Bundle`](crate::Bundle) impl declared the same field
    /// key twice, or storage was driven directly with a stale identity.
    #[error("{entity} is already present in column `{field}`")]
    DuplicateIdentity {
        /// The identity that was added twice.
        entity: Entity,
        /// Field name of the column that rejected it.
        field: &'static str,
    },
}
