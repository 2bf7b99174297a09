//! Archetype-based entity/component bookkeeping.
//!
//! This crate owns the pieces of an entity-component system that are purely
//! about *classifying* entities by the set of component types they carry:
//! registering component types ([`ComponentType`]), combining them into
//! canonical sets ([`Archetype`]), matching archetypes against predicates
//! ([`EntityFilter`]), and interning/looking up the per-archetype table group
//! an entity's row storage lives in ([`EntityTableLookup`],
//! [`EntityTableGrouping`], [`EntityQuery`]).
//!
//! Row storage itself, entity id allocation, scheduling and serialization are
//! deliberately out of scope: `EntityTable` is a marker a caller's own
//! storage type implements, not a type this crate defines.

mod archetype;
mod bitmask;
mod component;
mod error;
mod filter;
mod lookup;
mod query;
mod table;

pub use archetype::Archetype;
pub use component::{ComponentType, ComponentTypeCategory};
pub use error::EcsError;
pub use filter::{EntityFilter, EntityFilterBuilder};
pub use lookup::{EntityTableLookup, EntityTableLookupIter};
pub use query::EntityQuery;
pub use table::{EntityTable, EntityTableGrouping, EntityTableGroupingGuard};
