use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::bitmask;
use crate::table::{EntityTable, EntityTableGrouping};

/// `0` means "empty"/"end of chain"; a real index `i` is encoded as `!i` so
/// that index `0` (encoded as `!0`) never collides with the empty sentinel.
#[inline]
fn encode(index: usize) -> u32 {
    !(index as u32)
}

#[inline]
fn decode(raw: u32) -> usize {
    !raw as usize
}

struct Entry<T: EntityTable> {
    grouping: Arc<EntityTableGrouping<T>>,
    hash_code: u32,
}

/// One generation of the lookup's backing hash table.
///
/// Fixed capacity for its whole lifetime: growth never mutates a `Container`
/// in place, it builds a new, larger one and the owning
/// [`crate::lookup::EntityTableLookup`] publishes it wholesale. This is what
/// lets lock-free readers keep observing an old, still-consistent generation
/// after a grow they raced with.
pub(super) struct Container<T: EntityTable> {
    buckets: Box<[AtomicU32]>,
    entries: Box<[UnsafeCell<MaybeUninit<Entry<T>>>]>,
    next: Box<[AtomicU32]>,
    size: AtomicUsize,
}

// SAFETY: `entries`/`next` cells are written exactly once, by the sole
// writer (serialized by the lookup's write lock), before the bucket-head
// store that publishes them with `Release`; every read of a cell is reached
// only by following an `Acquire`-observed bucket head or `next` link, which
// happens-after that publishing store. No cell is ever read before it is
// written, and no cell is ever mutated after its initial write.
unsafe impl<T: EntityTable> Send for Container<T> {}
unsafe impl<T: EntityTable> Sync for Container<T> {}

impl<T: EntityTable> Container<T> {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            buckets: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            entries: (0..capacity).map(|_| UnsafeCell::new(MaybeUninit::uninit())).collect(),
            next: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            size: AtomicUsize::new(0),
        }
    }

    pub(super) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub(super) fn size(&self, ordering: Ordering) -> usize {
        self.size.load(ordering)
    }

    /// Lock-free lookup by trimmed bitmask. `h` is the already-masked
    /// 31-bit hash (see `EntityTableLookup::find`).
    pub(super) fn find(&self, h: u32, mask: &[u32]) -> Option<Arc<EntityTableGrouping<T>>> {
        let bucket = (h as usize) & (self.capacity() - 1);
        let mut raw = self.buckets[bucket].load(Ordering::Acquire);
        while raw != 0 {
            let idx = decode(raw);
            // SAFETY: `raw` was read with `Acquire` from a bucket head (or,
            // on later iterations, from a `next` link reached transitively
            // from one); either way it was published with `Release` only
            // after `entries[idx]`/`next[idx]` were fully written, so this
            // entry is initialized and stable.
            let entry = unsafe { (*self.entries[idx].get()).assume_init_ref() };
            if entry.hash_code == h && bitmask::equals(entry.grouping.archetype().bitmask().words(), mask) {
                return Some(Arc::clone(&entry.grouping));
            }
            raw = self.next[idx].load(Ordering::Relaxed);
        }
        None
    }

    /// Returns the grouping stored at snapshot index `idx < size`.
    pub(super) fn grouping_at(&self, idx: usize) -> Arc<EntityTableGrouping<T>> {
        // SAFETY: caller has observed `idx < size` via an `Acquire` load of
        // `size`, which happens-after the `Release` store that published
        // this entry in `push_raw`.
        let entry = unsafe { (*self.entries[idx].get()).assume_init_ref() };
        Arc::clone(&entry.grouping)
    }

    /// Appends `grouping` at the next free index. Caller (the lookup's
    /// single writer, under its write lock) must ensure `size < capacity`.
    pub(super) fn push(&self, grouping: Arc<EntityTableGrouping<T>>) {
        let h = bitmask::hash(grouping.archetype().bitmask().words()) as u32 & 0x7FFF_FFFF;
        self.push_raw(grouping, h);
    }

    fn push_raw(&self, grouping: Arc<EntityTableGrouping<T>>, hash_code: u32) {
        let idx = self.size.load(Ordering::Relaxed);
        debug_assert!(idx < self.capacity());
        let bucket = (hash_code as usize) & (self.capacity() - 1);
        let prev_head = self.buckets[bucket].load(Ordering::Relaxed);

        // SAFETY: `idx` is reserved exclusively to the writer (the lookup
        // serializes all writers on one mutex); no reader can reach index
        // `idx` until the bucket-head store below publishes it.
        // SAFETY: see the `entries` write above; `idx` is likewise reserved
        // exclusively to the writer.
        unsafe {
            (*self.entries[idx].get()).write(Entry { grouping, hash_code });
        }
        self.next[idx].store(prev_head, Ordering::Relaxed);
        self.buckets[bucket].store(encode(idx), Ordering::Release);
        self.size.store(idx + 1, Ordering::Release);
    }

    /// Builds the next generation: double capacity, every existing entry
    /// rehashed into it in the same relative order (so the new container's
    /// indices remain a stable extension of the old one's).
    pub(super) fn grow(&self) -> Container<T> {
        let grown = Container::with_capacity(self.capacity() * 2);
        let size = self.size.load(Ordering::Relaxed);
        for i in 0..size {
            // SAFETY: indices below `size` (read under the writer's own
            // lock) are fully initialized.
            let entry = unsafe { (*self.entries[i].get()).assume_init_ref() };
            grown.push_raw(Arc::clone(&entry.grouping), entry.hash_code);
        }
        grown
    }
}
