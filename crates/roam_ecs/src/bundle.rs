//! Bundle decomposition — how an aggregate value becomes component columns.
//!
//! A [`Bundle`] is a struct whose fields are stored individually at spawn
//! time. Columns are keyed by [`FieldKey`] — the pair of field *name* and
//! field *type* — so two unrelated bundle types that declare a field with the
//! same name and type write into the same column. A movement system can then
//! declare a narrow bundle shape and match entities spawned with a wider one,
//! as long as names and types line up.
//!
//! Implement the trait with the [`bundle!`] macro. Hand-written impls must
//! keep `fields`, `disperse`, `gather`, and `scatter` consistent with each
//! other: same fields, same declaration order.

use std::any::{self, Any, TypeId};

use crate::column::SparseColumn;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::storage::ColumnStorage;

/// Marker for types storable as component values.
///
/// Blanket-implemented: any `Clone + Send + Sync + 'static` type qualifies.
/// `Clone` is what lets the query layer stage values in a scratch bundle and
/// write them back, instead of aliasing column memory.
pub trait Component: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Component for T {}

/// Identity of a component column: the declaring field's name and type.
///
/// Matching is structural by design — `name` and `type_id` together decide
/// column identity, so bundles never need to share a common type to share
/// data. The flip side is that an accidental name+type collision between
/// unrelated bundles aliases them into one column; rename the field (or wrap
/// the type) to keep columns apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// The field name as declared in the bundle.
    pub name: &'static str,
    /// The Rust type of the field.
    pub type_id: TypeId,
}

impl FieldKey {
    /// The key for a field `name` of type `T`.
    #[must_use]
    pub fn of<T: 'static>(name: &'static str) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
        }
    }
}

/// One declared field of a bundle: its key plus what is needed to create the
/// backing column lazily.
#[derive(Clone, Copy)]
pub struct FieldDecl {
    key: FieldKey,
    type_name: &'static str,
    new_column: fn(&'static str) -> SparseColumn,
}

impl FieldDecl {
    /// Describe a field `name` of component type `T`.
    #[must_use]
    pub fn of<T: Component>(name: &'static str) -> Self {
        Self {
            key: FieldKey::of::<T>(name),
            type_name: any::type_name::<T>(),
            new_column: SparseColumn::new::<T>,
        }
    }

    /// The column key this field resolves to.
    #[must_use]
    pub fn key(&self) -> FieldKey {
        self.key
    }

    /// The declared field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.key.name
    }

    /// The field's type name, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Create an empty column able to store this field's values.
    #[must_use]
    pub(crate) fn create_column(&self) -> SparseColumn {
        (self.new_column)(self.key.name)
    }
}

impl std::fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDecl")
            .field("name", &self.key.name)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A decomposable aggregate: an ordered list of named, typed fields that are
/// inserted into — and read back out of — individual component columns.
///
/// The unit type `()` is the zero-field bundle; as a query shape it matches
/// every known entity, and spawning it records an identity with no data.
pub trait Bundle: Send + Sync + Sized + 'static {
    /// The declared fields, in declaration order.
    fn fields() -> Vec<FieldDecl>;

    /// Move each field into the insert sink, in declaration order.
    fn disperse(self, sink: &mut InsertSink) -> Result<(), EcsError>;

    /// Clone each field out of the source, in declaration order.
    fn gather(source: &mut FieldSource<'_>) -> Result<Self, EcsError>;

    /// Write each field back through the sink, in declaration order.
    fn scatter(self, sink: &mut FieldSink<'_>) -> Result<(), EcsError>;
}

impl Bundle for () {
    fn fields() -> Vec<FieldDecl> {
        Vec::new()
    }

    fn disperse(self, _sink: &mut InsertSink) -> Result<(), EcsError> {
        Ok(())
    }

    fn gather(_source: &mut FieldSource<'_>) -> Result<Self, EcsError> {
        Ok(())
    }

    fn scatter(self, _sink: &mut FieldSink<'_>) -> Result<(), EcsError> {
        Ok(())
    }
}

/// Object-safe companion to [`Bundle`], so pending spawns can be queued
/// type-erased until end-of-tick reconciliation.
pub trait DynBundle: Send + Sync {
    /// Type name of the underlying bundle, for diagnostics.
    fn bundle_name(&self) -> &'static str;

    /// Decompose into `storage` under `id`.
    fn insert_into(
        self: Box<Self>,
        id: Entity,
        storage: &mut ColumnStorage,
    ) -> Result<(), EcsError>;
}

impl<B: Bundle> DynBundle for B {
    fn bundle_name(&self) -> &'static str {
        any::type_name::<B>()
    }

    fn insert_into(
        self: Box<Self>,
        id: Entity,
        storage: &mut ColumnStorage,
    ) -> Result<(), EcsError> {
        storage.add(id, *self)
    }
}

/// Insert-side cursor: receives one value per declared field, in order.
///
/// Values are staged here and type-checked against the declaration before the
/// storage commits anything, which is what makes a failed insertion leave the
/// store untouched.
pub struct InsertSink {
    fields: Vec<FieldDecl>,
    staged: Vec<Box<dyn Any + Send + Sync>>,
    bundle: &'static str,
}

impl InsertSink {
    pub(crate) fn new(fields: Vec<FieldDecl>, bundle: &'static str) -> Self {
        let staged = Vec::with_capacity(fields.len());
        Self {
            fields,
            staged,
            bundle,
        }
    }

    /// Stage the next declared field's value.
    pub fn put<T: Component>(&mut self, value: T) -> Result<(), EcsError> {
        let cursor = self.staged.len();
        let decl = self
            .fields
            .get(cursor)
            .ok_or_else(|| EcsError::InvalidBundleShape {
                bundle: self.bundle,
                reason: format!(
                    "disperse produced more values than the {} declared fields",
                    self.fields.len()
                ),
            })?;
        if decl.key.type_id != TypeId::of::<T>() {
            return Err(EcsError::InvalidBundleShape {
                bundle: self.bundle,
                reason: format!(
                    "field `{}` expects {}, got {}",
                    decl.name(),
                    decl.type_name(),
                    any::type_name::<T>()
                ),
            });
        }
        self.staged.push(Box::new(value));
        Ok(())
    }

    /// Verify every declared field was staged and hand the values over.
    pub(crate) fn finish(
        self,
    ) -> Result<(Vec<FieldDecl>, Vec<Box<dyn Any + Send + Sync>>), EcsError> {
        if self.staged.len() != self.fields.len() {
            return Err(EcsError::InvalidBundleShape {
                bundle: self.bundle,
                reason: format!(
                    "disperse produced {} of the {} declared fields",
                    self.staged.len(),
                    self.fields.len()
                ),
            });
        }
        Ok((self.fields, self.staged))
    }
}

/// Gather-side cursor: clones one value per declared field out of the
/// resolved column positions, in order. The copy-in half of visitation.
pub struct FieldSource<'a> {
    storage: &'a ColumnStorage,
    fields: &'a [FieldDecl],
    positions: &'a [usize],
    cursor: usize,
    bundle: &'static str,
}

impl<'a> FieldSource<'a> {
    pub(crate) fn new(
        storage: &'a ColumnStorage,
        fields: &'a [FieldDecl],
        positions: &'a [usize],
        bundle: &'static str,
    ) -> Self {
        Self {
            storage,
            fields,
            positions,
            cursor: 0,
            bundle,
        }
    }

    /// Clone the next declared field's value out of its column.
    pub fn take<T: Component>(&mut self) -> Result<T, EcsError> {
        let (decl, position) = self.step()?;
        let column = self.storage.column(decl.key()).ok_or_else(|| {
            EcsError::InvalidBundleShape {
                bundle: self.bundle,
                reason: format!("field `{}` has no backing column", decl.name()),
            }
        })?;
        let value = column
            .get::<T>(position)
            .ok_or_else(|| EcsError::InvalidBundleShape {
                bundle: self.bundle,
                reason: format!(
                    "field `{}` does not match its column's stored type",
                    decl.name()
                ),
            })?;
        Ok(value.clone())
    }

    fn step(&mut self) -> Result<(FieldDecl, usize), EcsError> {
        let decl = self
            .fields
            .get(self.cursor)
            .copied()
            .ok_or_else(|| EcsError::InvalidBundleShape {
                bundle: self.bundle,
                reason: format!(
                    "gather read past the {} declared fields",
                    self.fields.len()
                ),
            })?;
        let position = self.positions[self.cursor];
        self.cursor += 1;
        Ok((decl, position))
    }
}

/// Scatter-side cursor: writes one value per declared field back to its
/// resolved column position, in order. The copy-out half of visitation.
pub struct FieldSink<'a> {
    storage: &'a mut ColumnStorage,
    fields: &'a [FieldDecl],
    positions: &'a [usize],
    cursor: usize,
    bundle: &'static str,
}

impl<'a> FieldSink<'a> {
    pub(crate) fn new(
        storage: &'a mut ColumnStorage,
        fields: &'a [FieldDecl],
        positions: &'a [usize],
        bundle: &'static str,
    ) -> Self {
        Self {
            storage,
            fields,
            positions,
            cursor: 0,
            bundle,
        }
    }

    /// Write the next declared field's value back to its column.
    pub fn store<T: Component>(&mut self, value: T) -> Result<(), EcsError> {
        let cursor = self.cursor;
        let decl = self
            .fields
            .get(cursor)
            .copied()
            .ok_or_else(|| EcsError::InvalidBundleShape {
                bundle: self.bundle,
                reason: format!(
                    "scatter wrote past the {} declared fields",
                    self.fields.len()
                ),
            })?;
        let position = self.positions[cursor];
        self.cursor += 1;
        let column =
            self.storage
                .column_mut(decl.key())
                .ok_or_else(|| EcsError::InvalidBundleShape {
                    bundle: self.bundle,
                    reason: format!("field `{}` has no backing column", decl.name()),
                })?;
        column.set(position, value)
    }
}

/// Define a struct and implement [`Bundle`] for it.
///
/// Fields must be [`Component`] types (`Clone + Send + Sync + 'static`).
/// Attributes (including derives) and visibilities pass through; tuple
/// structs are not supported, because column identity needs field names.
///
/// ```
/// use roam_ecs::bundle;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// pub struct Position {
///     pub x: f64,
///     pub y: f64,
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// pub struct Velocity {
///     pub x: f64,
///     pub y: f64,
/// }
///
/// bundle! {
///     /// The kinematic pair.
///     #[derive(Debug, Clone)]
///     pub struct Kinematics {
///         pub pos: Position,
///         pub vel: Velocity,
///     }
/// }
/// ```
#[macro_export]
macro_rules! bundle {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )+
        }

        impl $crate::Bundle for $name {
            fn fields() -> ::std::vec::Vec<$crate::FieldDecl> {
                ::std::vec![
                    $($crate::FieldDecl::of::<$ty>(::std::stringify!($field)),)+
                ]
            }

            fn disperse(
                self,
                sink: &mut $crate::InsertSink,
            ) -> ::std::result::Result<(), $crate::EcsError> {
                $(sink.put(self.$field)?;)+
                ::std::result::Result::Ok(())
            }

            fn gather(
                source: &mut $crate::FieldSource<'_>,
            ) -> ::std::result::Result<Self, $crate::EcsError> {
                ::std::result::Result::Ok(Self {
                    $($field: source.take()?,)+
                })
            }

            fn scatter(
                self,
                sink: &mut $crate::FieldSink<'_>,
            ) -> ::std::result::Result<(), $crate::EcsError> {
                $(sink.store(self.$field)?;)+
                ::std::result::Result::Ok(())
            }
        }
    };
}
