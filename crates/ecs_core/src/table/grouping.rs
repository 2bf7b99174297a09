use std::ops::Deref;
use std::sync::RwLock;

use crate::archetype::Archetype;

/// Marker for the per-archetype row storage a grouping holds zero or more of.
///
/// Content and concurrency of the table itself are external to this core
/// (the contract only requires that a table can be handed out as a cheap,
/// shareable handle); `Clone` is required so [`EntityTableGrouping::tables`]
/// can hand out independent snapshots without holding its internal lock open
/// across caller code.
pub trait EntityTable: Send + Sync + Clone {}
impl<T: Send + Sync + Clone> EntityTable for T {}

/// One per distinct archetype: the archetype itself plus an ordered list of
/// `EntityTable`s for it. Published to enumerators only after full
/// construction (see [`crate::lookup::EntityTableLookup`]).
///
/// Thread-safety for iteration concurrent with additions is this type's
/// responsibility, not the owning lookup's: it is provided here by guarding
/// the table list with a `RwLock`.
#[derive(Debug)]
pub struct EntityTableGrouping<T: EntityTable> {
    archetype: Archetype,
    tables: RwLock<Vec<T>>,
}

impl<T: EntityTable> EntityTableGrouping<T> {
    pub(crate) fn new(archetype: Archetype) -> Self {
        Self {
            archetype,
            tables: RwLock::new(Vec::new()),
        }
    }

    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// Appends a table, visible to any enumerator started afterwards.
    pub fn push(&self, table: T) {
        self.tables.write().unwrap().push(table);
    }

    pub fn len(&self) -> usize {
        self.tables.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A stable, read-locked view over the current table list.
    pub fn tables(&self) -> EntityTableGroupingGuard<'_, T> {
        EntityTableGroupingGuard(self.tables.read().unwrap())
    }

    /// Clones the current table list out from under the lock; used by
    /// `EntityQuery` so it never holds a grouping's lock across caller code.
    pub fn snapshot_tables(&self) -> Vec<T> {
        self.tables.read().unwrap().clone()
    }
}

/// Read-locked view over an [`EntityTableGrouping`]'s current tables.
pub struct EntityTableGroupingGuard<'a, T: EntityTable>(std::sync::RwLockReadGuard<'a, Vec<T>>);

impl<'a, T: EntityTable> Deref for EntityTableGroupingGuard<'a, T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
