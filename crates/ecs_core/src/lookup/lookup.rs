use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::archetype::Archetype;
use crate::bitmask;
use crate::component::ComponentType;
use crate::error::EcsError;
use crate::table::{EntityTable, EntityTableGrouping};

use super::container::Container;

const INITIAL_CAPACITY: usize = 8;

/// Concurrent intern table from an archetype's bitmask to its
/// [`EntityTableGrouping`].
///
/// Readers (`find`, `contains`, `try_get_grouping`, `tables_of`, `copy_to`,
/// the random-access getter, `enumerate`) need no synchronization beyond the
/// acquire loads this type performs internally. Writers (`get_grouping` and
/// the two neighbor operations) serialize on a single mutex; see the crate's
/// concurrency notes for the publication ordering this relies on.
pub struct EntityTableLookup<T: EntityTable> {
    container: ArcSwap<Container<T>>,
    write_lock: Mutex<()>,
}

impl<T: EntityTable> Default for EntityTableLookup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: EntityTable> EntityTableLookup<T> {
    pub fn new() -> Self {
        Self {
            container: ArcSwap::new(Arc::new(Container::with_capacity(INITIAL_CAPACITY))),
            write_lock: Mutex::new(()),
        }
    }

    /// Number of interned groupings. Lock-free.
    pub fn count(&self) -> usize {
        self.container.load().size(Ordering::Acquire)
    }

    /// Current backing capacity. Lock-free.
    pub fn capacity(&self) -> usize {
        self.container.load().capacity()
    }

    pub fn contains(&self, archetype: &Archetype) -> bool {
        self.try_get_grouping(archetype).is_some()
    }

    /// Lock-free read; returns `None` rather than inserting.
    pub fn try_get_grouping(&self, archetype: &Archetype) -> Option<Arc<EntityTableGrouping<T>>> {
        let mask = archetype.bitmask().words();
        let h = hash_of(mask);
        self.container.load().find(h, mask)
    }

    /// The grouping's table list, or an empty sequence if the archetype has
    /// never been interned. Never inserts.
    pub fn tables_of(&self, archetype: &Archetype) -> Vec<T> {
        match self.try_get_grouping(archetype) {
            Some(grouping) => grouping.snapshot_tables(),
            None => Vec::new(),
        }
    }

    /// Interns `archetype`'s own grouping, creating it if necessary.
    pub fn get_grouping(&self, archetype: &Archetype) -> Arc<EntityTableGrouping<T>> {
        if let Some(grouping) = self.try_get_grouping(archetype) {
            return grouping;
        }
        self.insert(archetype.clone())
    }

    /// The grouping for `archetype \ {component}`. Defers building the
    /// neighbor `Archetype` until after a `find` miss, computing its bitmask
    /// directly instead.
    pub fn get_subgrouping(&self, archetype: &Archetype, component: ComponentType) -> Arc<EntityTableGrouping<T>> {
        let mut mask = archetype.bitmask().clone();
        mask.clear(component.id() as usize);
        let h = hash_of(mask.words());
        if let Some(grouping) = self.container.load().find(h, mask.words()) {
            return grouping;
        }
        self.insert(archetype.remove(component))
    }

    /// The grouping for `archetype ∪ {component}`. Same deferred-construction
    /// strategy as [`Self::get_subgrouping`].
    pub fn get_supergrouping(&self, archetype: &Archetype, component: ComponentType) -> Arc<EntityTableGrouping<T>> {
        let mut mask = archetype.bitmask().clone();
        mask.set(component.id() as usize);
        let h = hash_of(mask.words());
        if let Some(grouping) = self.container.load().find(h, mask.words()) {
            return grouping;
        }
        self.insert(archetype.add(component))
    }

    /// Random-access read by snapshot insertion index.
    pub fn get_grouping_at(&self, index: usize) -> Result<Arc<EntityTableGrouping<T>>, EcsError> {
        let container = self.container.load();
        let size = container.size(Ordering::Acquire);
        if index >= size {
            return Err(EcsError::out_of_range(index, size));
        }
        Ok(container.grouping_at(index))
    }

    /// Snapshots the container, bounds-checks, then copies every currently
    /// interned grouping into `dest` starting at `dest_start`.
    pub fn copy_to(&self, dest: &mut [Arc<EntityTableGrouping<T>>], dest_start: usize) -> Result<(), EcsError> {
        let container = self.container.load();
        let size = container.size(Ordering::Acquire);
        let fits = matches!(dest_start.checked_add(size), Some(end) if end <= dest.len());
        if !fits {
            return Err(EcsError::out_of_range(dest_start, dest.len()));
        }
        for i in 0..size {
            dest[dest_start + i] = container.grouping_at(i);
        }
        Ok(())
    }

    /// Snapshots the container pointer and its size; the returned iterator
    /// will not observe groupings inserted afterwards.
    pub fn enumerate(&self) -> EntityTableLookupIter<T> {
        let container = self.container.load_full();
        let size = container.size(Ordering::Acquire);
        EntityTableLookupIter {
            container,
            size,
            index: 0,
        }
    }

    fn insert(&self, archetype: Archetype) -> Arc<EntityTableGrouping<T>> {
        let _guard = self.write_lock.lock().unwrap();
        let mask = archetype.bitmask().words();
        let h = hash_of(mask);
        if let Some(grouping) = self.container.load().find(h, mask) {
            return grouping;
        }
        let grouping = Arc::new(EntityTableGrouping::new(archetype));
        self.publish(Arc::clone(&grouping));
        grouping
    }

    fn publish(&self, grouping: Arc<EntityTableGrouping<T>>) {
        let current = self.container.load_full();
        let size = current.size(Ordering::Relaxed);
        if size == current.capacity() {
            let grown = Arc::new(current.grow());
            tracing::info!(
                old_capacity = current.capacity(),
                new_capacity = grown.capacity(),
                migrated = size,
                "entity table lookup grown"
            );
            self.container.store(Arc::clone(&grown));
            grown.push(grouping);
        } else {
            current.push(grouping);
        }
    }
}

fn hash_of(mask: &[u32]) -> u32 {
    bitmask::hash(mask) as u32 & 0x7FFF_FFFF
}

/// Stable, race-free traversal over a snapshot of the lookup taken at
/// construction; groupings inserted afterwards are simply not visited.
pub struct EntityTableLookupIter<T: EntityTable> {
    container: Arc<Container<T>>,
    size: usize,
    index: usize,
}

impl<T: EntityTable> Iterator for EntityTableLookupIter<T> {
    type Item = Arc<EntityTableGrouping<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.size {
            return None;
        }
        let grouping = self.container.grouping_at(self.index);
        self.index += 1;
        Some(grouping)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.size - self.index;
        (remaining, Some(remaining))
    }
}

impl<T: EntityTable> ExactSizeIterator for EntityTableLookupIter<T> {}
