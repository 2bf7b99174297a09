mod container;
mod lookup;

pub use lookup::{EntityTableLookup, EntityTableLookupIter};
