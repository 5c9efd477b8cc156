//! Queries — the AND-join across columns and its typed visitation facade.
//!
//! A [`Query`] resolves a bundle shape to its columns and visits every entity
//! present in all of them. The first declared field is the **driver**: its
//! column's entries form the outer loop, so declaring the least-populated
//! column first minimises work. That choice is a caller-visible tuning knob,
//! not an engine guarantee, and iteration order across entities is
//! unspecified either way.
//!
//! Visitation uses copy-in/copy-out: an entity's field values live in
//! physically separate columns, so they are staged into one scratch bundle
//! for the callback and written back when it returns. Writes through the
//! scratch become visible to the columns only after the invocation returns.

use std::any;
use std::marker::PhantomData;

use crate::bundle::{Bundle, FieldDecl, FieldSink, FieldSource};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::storage::ColumnStorage;

/// A validated, ordered field list derived from a bundle type.
///
/// A shape with zero fields is legal and denotes "every known identity".
#[derive(Debug)]
pub struct Shape {
    fields: Vec<FieldDecl>,
    bundle: &'static str,
}

impl Shape {
    /// Derive and validate the shape of `B`.
    ///
    /// Fails with [`EcsError::InvalidBundleShape`] if two declared fields
    /// resolve to the same column key.
    pub fn of<B: Bundle>() -> Result<Self, EcsError> {
        let fields = B::fields();
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|prior| prior.key() == field.key()) {
                return Err(EcsError::InvalidBundleShape {
                    bundle: any::type_name::<B>(),
                    reason: format!("field `{}` is declared more than once", field.name()),
                });
            }
        }
        Ok(Self {
            fields,
            bundle: any::type_name::<B>(),
        })
    }

    /// The declared fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` for the zero-field "every entity" shape.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Type name of the bundle this shape was derived from.
    #[must_use]
    pub fn bundle(&self) -> &'static str {
        self.bundle
    }
}

/// A typed view over the entities that hold every field of `B`.
///
/// Holds the storage exclusively for its lifetime; queries within a tick are
/// therefore strictly sequential, and each observes every earlier copy-out.
#[derive(Debug)]
pub struct Query<'w, B: Bundle> {
    storage: &'w mut ColumnStorage,
    shape: Shape,
    _bundle: PhantomData<fn() -> B>,
}

impl<'w, B: Bundle> Query<'w, B> {
    /// Build a query over `storage`, resolving each shape field to its
    /// column in declaration order.
    ///
    /// Columns are created lazily, so querying ahead of the first matching
    /// spawn succeeds and simply matches nothing.
    pub fn new(storage: &'w mut ColumnStorage) -> Result<Self, EcsError> {
        let shape = Shape::of::<B>()?;
        for decl in shape.fields() {
            storage.resolve_mut(decl);
        }
        Ok(Self {
            storage,
            shape,
            _bundle: PhantomData,
        })
    }

    /// Visit every matching entity.
    ///
    /// Each invocation receives a scratch value assembled from the entity's
    /// columns; mutations through it are committed back to the columns when
    /// the invocation returns.
    pub fn for_each(&mut self, mut visit: impl FnMut(&mut B)) -> Result<(), EcsError> {
        self.iterate(|_, bundle| {
            visit(bundle);
            true
        })
    }

    /// As [`Query::for_each`], also exposing the entity identity and
    /// stopping after any invocation that returns `false`.
    ///
    /// The terminating invocation's writes are still committed.
    pub fn iterate(
        &mut self,
        mut visit: impl FnMut(Entity, &mut B) -> bool,
    ) -> Result<(), EcsError> {
        let bundle = self.shape.bundle();

        if self.shape.is_empty() {
            // Zero-field shape: every known identity matches, no data moves.
            let ids: Vec<Entity> = self.storage.known().collect();
            for id in ids {
                let mut source = FieldSource::new(&*self.storage, &[], &[], bundle);
                let mut scratch = B::gather(&mut source)?;
                if !visit(id, &mut scratch) {
                    break;
                }
            }
            return Ok(());
        }

        let fields = self.shape.fields().to_vec();
        let driver = &fields[0];
        // Snapshot the driver's entries: insertion is deferred to end of
        // tick, so the set of matched entities cannot change mid-iteration.
        let pairs: Vec<(Entity, usize)> = match self.storage.column(driver.key()) {
            Some(column) => column.pairs().collect(),
            None => Vec::new(),
        };

        let mut positions = Vec::with_capacity(fields.len());
        'entities: for (id, driver_position) in pairs {
            positions.clear();
            positions.push(driver_position);
            for decl in &fields[1..] {
                match self.storage.column(decl.key()).and_then(|c| c.lookup(id)) {
                    Some(position) => positions.push(position),
                    // AND-join: every declared field is required.
                    None => continue 'entities,
                }
            }

            // Copy-in: stage the entity's values as one scratch bundle.
            let mut source = FieldSource::new(&*self.storage, &fields, &positions, bundle);
            let mut scratch = B::gather(&mut source)?;

            let proceed = visit(id, &mut scratch);

            // Copy-out: commit the callback's writes, then honour early exit.
            let mut sink = FieldSink::new(&mut *self.storage, &fields, &positions, bundle);
            scratch.scatter(&mut sink)?;

            if !proceed {
                break;
            }
        }
        Ok(())
    }
}
