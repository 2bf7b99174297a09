use std::sync::{Arc, Mutex};

use crate::filter::EntityFilter;
use crate::lookup::EntityTableLookup;
use crate::table::{EntityTable, EntityTableGrouping};

struct Cache<T: EntityTable> {
    results: Vec<Arc<EntityTableGrouping<T>>>,
    previous_lookup_count: usize,
}

/// Lazy, optionally-cached enumeration over a lookup's groupings, filtered.
///
/// `Rust` has no constructor overloading, so the three forms the contract
/// names (`new(lookup)`, `new(lookup, filter)`, `new(lookup, filter,
/// cache)`) are three distinctly-named constructors here: [`EntityQuery::new`],
/// [`EntityQuery::with_filter`] and [`EntityQuery::with_cache`].
pub struct EntityQuery<T: EntityTable> {
    lookup: Arc<EntityTableLookup<T>>,
    filter: EntityFilter,
    cache: Option<Mutex<Cache<T>>>,
}

/// Initial capacity for a newly-enabled query cache; grows geometrically
/// from here as `Vec::push` does.
const INITIAL_CACHE_CAPACITY: usize = 4;

impl<T: EntityTable> EntityQuery<T> {
    /// Uncached query over every archetype (the universal filter).
    pub fn new(lookup: Arc<EntityTableLookup<T>>) -> Self {
        Self::with_filter(lookup, EntityFilter::universal())
    }

    /// Uncached query over archetypes matching `filter`.
    pub fn with_filter(lookup: Arc<EntityTableLookup<T>>, filter: EntityFilter) -> Self {
        Self::with_cache(lookup, filter, false)
    }

    /// Query over archetypes matching `filter`, optionally memoizing which
    /// groupings have matched across enumerations.
    pub fn with_cache(lookup: Arc<EntityTableLookup<T>>, filter: EntityFilter, enable_cache: bool) -> Self {
        let cache = enable_cache.then(|| {
            Mutex::new(Cache {
                results: Vec::with_capacity(INITIAL_CACHE_CAPACITY),
                previous_lookup_count: 0,
            })
        });
        Self { lookup, filter, cache }
    }

    pub fn filter(&self) -> &EntityFilter {
        &self.filter
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Every table in every grouping whose archetype matches this query's
    /// filter, in lookup insertion order, without duplicates.
    pub fn enumerate(&self) -> impl Iterator<Item = T> {
        self.matching_groupings()
            .into_iter()
            .flat_map(|grouping| grouping.snapshot_tables())
    }

    fn matching_groupings(&self) -> Vec<Arc<EntityTableGrouping<T>>> {
        match &self.cache {
            None => self
                .lookup
                .enumerate()
                .filter(|grouping| self.filter.matches(grouping.archetype()))
                .collect(),
            Some(cache_lock) => {
                let mut cache = cache_lock.lock().unwrap();
                let current_count = self.lookup.count();
                if cache.previous_lookup_count < current_count {
                    for index in cache.previous_lookup_count..current_count {
                        if let Ok(grouping) = self.lookup.get_grouping_at(index) {
                            if self.filter.matches(grouping.archetype()) {
                                cache.results.push(grouping);
                            }
                        }
                    }
                    cache.previous_lookup_count = current_count;
                }
                cache.results.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::Archetype;
    use crate::component::ComponentType;

    #[derive(Clone, Debug, PartialEq)]
    struct FakeTable(u32);

    fn comp<T: 'static>() -> ComponentType {
        ComponentType::type_of::<T>()
    }

    #[test]
    fn uncached_enumerate_yields_every_table_in_matching_groupings() {
        struct A;
        struct B;
        let lookup = Arc::new(EntityTableLookup::<FakeTable>::new());
        let with_a = lookup.get_grouping(&Archetype::create([comp::<A>()]));
        with_a.push(FakeTable(1));
        with_a.push(FakeTable(2));
        lookup.get_grouping(&Archetype::create([comp::<B>()]));

        let filter = EntityFilter::create([comp::<A>()], [], []);
        let query = EntityQuery::with_filter(Arc::clone(&lookup), filter);
        let mut results: Vec<_> = query.enumerate().collect();
        results.sort_by_key(|t| t.0);
        assert_eq!(results, vec![FakeTable(1), FakeTable(2)]);
    }

    #[test]
    fn universal_query_enumerates_every_table() {
        struct A;
        struct B;
        let lookup = Arc::new(EntityTableLookup::<FakeTable>::new());
        lookup.get_grouping(&Archetype::create([comp::<A>()])).push(FakeTable(1));
        lookup.get_grouping(&Archetype::create([comp::<B>()])).push(FakeTable(2));

        let query = EntityQuery::new(Arc::clone(&lookup));
        let mut results: Vec<_> = query.enumerate().collect();
        results.sort_by_key(|t| t.0);
        assert_eq!(results, vec![FakeTable(1), FakeTable(2)]);
    }

    #[test]
    fn cache_grows_by_exactly_one_when_a_matching_grouping_is_added() {
        struct A;
        let lookup = Arc::new(EntityTableLookup::<FakeTable>::new());
        let query = EntityQuery::with_cache(Arc::clone(&lookup), EntityFilter::universal(), true);

        assert!(query.enumerate().next().is_none());

        lookup.get_grouping(&Archetype::create([comp::<A>()])).push(FakeTable(7));

        let results: Vec<_> = query.enumerate().collect();
        assert_eq!(results, vec![FakeTable(7)]);
    }
}
