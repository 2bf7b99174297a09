use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::archetype::{canonicalize, Archetype};
use crate::bitmask::{self, Bitmask};
use crate::component::ComponentType;

/// Immutable predicate over archetypes, decomposed into three independently
/// canonicalized component-type sets.
///
/// Equality (and hashing) compare only the three bitmasks, not the carried
/// type sequences, so two filters built from differently-ordered inputs
/// compare equal — which is what makes `EntityFilter` usable as a hash-table
/// key for query caches above this layer.
#[derive(Clone, Debug)]
pub struct EntityFilter {
    required_types: Vec<ComponentType>,
    included_types: Vec<ComponentType>,
    excluded_types: Vec<ComponentType>,
    required: Bitmask,
    included: Bitmask,
    excluded: Bitmask,
}

impl EntityFilter {
    /// The filter that matches every archetype (all three sets empty).
    pub fn universal() -> Self {
        static UNIVERSAL: OnceLock<EntityFilter> = OnceLock::new();
        UNIVERSAL
            .get_or_init(|| EntityFilter::create([], [], []))
            .clone()
    }

    /// Canonicalizes each of the three sets independently and builds a
    /// filter. Equivalent to `Universal` when all three end up empty.
    pub fn create(
        required: impl IntoIterator<Item = ComponentType>,
        included: impl IntoIterator<Item = ComponentType>,
        excluded: impl IntoIterator<Item = ComponentType>,
    ) -> Self {
        let (required_types, required_mask) = canonicalize(required);
        let (included_types, included_mask) = canonicalize(included);
        let (excluded_types, excluded_mask) = canonicalize(excluded);
        Self {
            required_types,
            included_types,
            excluded_types,
            required: required_mask,
            included: included_mask,
            excluded: excluded_mask,
        }
    }

    pub fn builder() -> EntityFilterBuilder {
        EntityFilterBuilder::default()
    }

    pub fn to_builder(&self) -> EntityFilterBuilder {
        EntityFilterBuilder {
            required: self.required_types.clone(),
            included: self.included_types.clone(),
            excluded: self.excluded_types.clone(),
        }
    }

    pub fn required(&self) -> &[ComponentType] {
        &self.required_types
    }

    pub fn included(&self) -> &[ComponentType] {
        &self.included_types
    }

    pub fn excluded(&self) -> &[ComponentType] {
        &self.excluded_types
    }

    /// `required ⊆ archetype ∧ (included = ∅ ∨ included ∩ archetype ≠ ∅) ∧
    /// excluded ∩ archetype = ∅`.
    pub fn matches(&self, archetype: &Archetype) -> bool {
        let mask = archetype.bitmask().words();
        bitmask::requires(self.required.words(), mask)
            && bitmask::includes(self.included.words(), mask)
            && bitmask::excludes(self.excluded.words(), mask)
    }
}

impl PartialEq for EntityFilter {
    fn eq(&self, other: &Self) -> bool {
        self.required == other.required && self.included == other.included && self.excluded == other.excluded
    }
}
impl Eq for EntityFilter {}

impl Hash for EntityFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.required.hash(state);
        self.included.hash(state);
        self.excluded.hash(state);
    }
}

/// Accumulates the three component-type sets and emits an [`EntityFilter`]
/// on demand.
#[derive(Debug, Default, Clone)]
pub struct EntityFilterBuilder {
    required: Vec<ComponentType>,
    included: Vec<ComponentType>,
    excluded: Vec<ComponentType>,
}

impl EntityFilterBuilder {
    pub fn require(mut self, component: ComponentType) -> Self {
        self.required.push(component);
        self
    }

    pub fn include(mut self, component: ComponentType) -> Self {
        self.included.push(component);
        self
    }

    pub fn exclude(mut self, component: ComponentType) -> Self {
        self.excluded.push(component);
        self
    }

    pub fn build(self) -> EntityFilter {
        EntityFilter::create(self.required, self.included, self.excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp<T: 'static>() -> ComponentType {
        ComponentType::type_of::<T>()
    }

    #[test]
    fn universal_matches_every_archetype() {
        struct A;
        let universal = EntityFilter::universal();
        assert!(universal.matches(&Archetype::empty()));
        assert!(universal.matches(&Archetype::create([comp::<A>()])));
    }

    #[test]
    fn matches_combines_required_included_excluded() {
        struct A;
        struct B;
        struct C;
        let (a, b, c) = (comp::<A>(), comp::<B>(), comp::<C>());
        let filter = EntityFilter::builder().require(a).exclude(c).build();

        assert!(filter.matches(&Archetype::create([a])));
        assert!(filter.matches(&Archetype::create([a, b])));
        assert!(!filter.matches(&Archetype::create([a, c])));
        assert!(!filter.matches(&Archetype::create([b])));
    }

    #[test]
    fn equality_ignores_input_order() {
        struct A;
        struct B;
        let (a, b) = (comp::<A>(), comp::<B>());
        let first = EntityFilter::create([a, b], [], []);
        let second = EntityFilter::create([b, a], [], []);
        assert_eq!(first, second);
    }

    #[test]
    fn all_empty_sets_equal_universal() {
        assert_eq!(EntityFilter::create([], [], []), EntityFilter::universal());
    }
}
