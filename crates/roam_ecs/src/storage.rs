//! Column storage — every component column, keyed by field name and type.
//!
//! [`ColumnStorage`] owns one [`SparseColumn`] per [`FieldKey`] plus the
//! known-identities set: every entity that has ever been given data,
//! including entities spawned with an empty-shaped bundle. Columns are
//! created lazily on first use of a key, so querying a shape nothing has
//! spawned yet simply matches nothing.

use std::any;
use std::collections::{HashMap, HashSet};

use crate::bundle::{Bundle, DynBundle, FieldDecl, FieldKey, InsertSink};
use crate::column::SparseColumn;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::query::Shape;

/// The component store: all columns plus the known-identities set.
///
/// The only mutations it supports are whole-bundle insertion (driven by
/// end-of-tick reconciliation) and in-place value replacement (driven by
/// query copy-outs). Nothing is ever removed.
#[derive(Debug, Default)]
pub struct ColumnStorage {
    /// Columns keyed by (field name, field type).
    columns: HashMap<FieldKey, SparseColumn>,
    /// Every identity ever given data, empty-shaped bundles included.
    known: HashSet<Entity>,
}

impl ColumnStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompose `bundle` and append each field into its column under `id`,
    /// then record `id` in the known-identities set.
    ///
    /// Insertion is atomic per identity: the bundle's values are staged and
    /// type-checked, and every column is checked for a duplicate, before the
    /// first append — so a failed add leaves neither the known set nor any
    /// column touched.
    pub fn add<B: Bundle>(&mut self, id: Entity, bundle: B) -> Result<(), EcsError> {
        let shape = Shape::of::<B>()?;
        let mut sink = InsertSink::new(shape.fields().to_vec(), any::type_name::<B>());
        bundle.disperse(&mut sink)?;
        let (fields, staged) = sink.finish()?;

        for decl in &fields {
            if self.resolve_mut(decl).lookup(id).is_some() {
                return Err(EcsError::DuplicateIdentity {
                    entity: id,
                    field: decl.name(),
                });
            }
        }

        for (decl, value) in fields.iter().zip(staged) {
            self.resolve_mut(decl).push_erased(id, value)?;
        }
        self.known.insert(id);
        Ok(())
    }

    /// As [`ColumnStorage::add`], for a type-erased pending bundle.
    pub fn add_dyn(&mut self, id: Entity, bundle: Box<dyn DynBundle>) -> Result<(), EcsError> {
        bundle.insert_into(id, self)
    }

    /// The column for `decl`'s key, created empty if absent.
    pub fn resolve_mut(&mut self, decl: &FieldDecl) -> &mut SparseColumn {
        self.columns
            .entry(decl.key())
            .or_insert_with(|| decl.create_column())
    }

    /// The column for `key`, if one has been created.
    #[must_use]
    pub fn column(&self, key: FieldKey) -> Option<&SparseColumn> {
        self.columns.get(&key)
    }

    /// Mutable access to the column for `key`, if one has been created.
    pub fn column_mut(&mut self, key: FieldKey) -> Option<&mut SparseColumn> {
        self.columns.get_mut(&key)
    }

    /// Number of distinct identities that have ever been given data.
    #[must_use]
    pub fn count(&self) -> usize {
        self.known.len()
    }

    /// Returns `true` if `id` has ever been given data.
    #[must_use]
    pub fn contains(&self, id: Entity) -> bool {
        self.known.contains(&id)
    }

    /// Iterate every known identity, in unspecified order.
    pub fn known(&self) -> impl Iterator<Item = Entity> + '_ {
        self.known.iter().copied()
    }

    /// Number of columns created so far.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Sprite {
        glyph: char,
    }

    bundle! {
        #[derive(Debug, Clone)]
        struct Plain {
            pos: Position,
            vel: Velocity,
        }
    }

    bundle! {
        #[derive(Debug, Clone)]
        struct Decorated {
            pos: Position,
            vel: Velocity,
            sprite: Sprite,
        }
    }

    /// A deliberately inconsistent hand-written bundle: it declares two
    /// fields but disperses only one.
    #[derive(Debug, Clone)]
    struct Lopsided {
        pos: Position,
    }

    impl Bundle for Lopsided {
        fn fields() -> Vec<FieldDecl> {
            vec![
                FieldDecl::of::<Position>("pos"),
                FieldDecl::of::<Velocity>("vel"),
            ]
        }

        fn disperse(self, sink: &mut InsertSink) -> Result<(), EcsError> {
            sink.put(self.pos)
        }

        fn gather(source: &mut crate::FieldSource<'_>) -> Result<Self, EcsError> {
            Ok(Self {
                pos: source.take()?,
            })
        }

        fn scatter(self, sink: &mut crate::FieldSink<'_>) -> Result<(), EcsError> {
            sink.store(self.pos)
        }
    }

    fn plain(x: f64) -> Plain {
        Plain {
            pos: Position { x, y: 0.0 },
            vel: Velocity { x: 1.0, y: 1.0 },
        }
    }

    #[test]
    fn test_add_creates_one_column_per_field() {
        let mut storage = ColumnStorage::new();
        storage.add(Entity::from_raw(1), plain(0.0)).unwrap();
        assert_eq!(storage.column_count(), 2);
        assert_eq!(storage.count(), 1);
        assert!(storage.contains(Entity::from_raw(1)));
    }

    #[test]
    fn test_count_tracks_distinct_identities() {
        let mut storage = ColumnStorage::new();
        for raw in 1..=5u64 {
            storage.add(Entity::from_raw(raw), plain(raw as f64)).unwrap();
            assert_eq!(storage.count(), raw as usize);
        }
    }

    #[test]
    fn test_structurally_equal_fields_share_columns() {
        let mut storage = ColumnStorage::new();
        storage.add(Entity::from_raw(1), plain(0.0)).unwrap();
        storage
            .add(
                Entity::from_raw(2),
                Decorated {
                    pos: Position { x: 5.0, y: 5.0 },
                    vel: Velocity { x: 0.0, y: 0.0 },
                    sprite: Sprite { glyph: 'b' },
                },
            )
            .unwrap();

        // pos and vel are shared; only sprite is new.
        assert_eq!(storage.column_count(), 3);
        let pos = storage.column(FieldKey::of::<Position>("pos")).unwrap();
        assert_eq!(pos.len(), 2);
        assert!(pos.lookup(Entity::from_raw(1)).is_some());
        assert!(pos.lookup(Entity::from_raw(2)).is_some());
    }

    #[test]
    fn test_empty_bundle_only_touches_known_set() {
        let mut storage = ColumnStorage::new();
        storage.add(Entity::from_raw(1), ()).unwrap();
        assert_eq!(storage.count(), 1);
        assert_eq!(storage.column_count(), 0);
    }

    #[test]
    fn test_duplicate_identity_is_rejected() {
        let mut storage = ColumnStorage::new();
        storage.add(Entity::from_raw(1), plain(0.0)).unwrap();
        let err = storage.add(Entity::from_raw(1), plain(1.0)).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateIdentity { .. }));
        // Columns are unchanged by the failed add.
        let pos = storage.column(FieldKey::of::<Position>("pos")).unwrap();
        assert_eq!(pos.len(), 1);
        assert_eq!(pos.get::<Position>(0), Some(&Position { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn test_failed_add_leaves_no_partial_state() {
        let mut storage = ColumnStorage::new();
        let err = storage
            .add(
                Entity::from_raw(1),
                Lopsided {
                    pos: Position { x: 0.0, y: 0.0 },
                },
            )
            .unwrap_err();
        assert!(matches!(err, EcsError::InvalidBundleShape { .. }));
        assert_eq!(storage.count(), 0);
        assert!(!storage.contains(Entity::from_raw(1)));
        // No column gained a value for the failed identity.
        if let Some(pos) = storage.column(FieldKey::of::<Position>("pos")) {
            assert!(pos.is_empty());
        }
    }

    #[test]
    fn test_add_dyn_matches_typed_add() {
        let mut storage = ColumnStorage::new();
        let pending: Box<dyn DynBundle> = Box::new(plain(7.0));
        storage.add_dyn(Entity::from_raw(1), pending).unwrap();
        assert_eq!(storage.count(), 1);
        let pos = storage.column(FieldKey::of::<Position>("pos")).unwrap();
        assert_eq!(pos.get::<Position>(0), Some(&Position { x: 7.0, y: 0.0 }));
    }
}
