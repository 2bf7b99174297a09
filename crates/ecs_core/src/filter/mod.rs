mod filter;

pub use filter::{EntityFilter, EntityFilterBuilder};
