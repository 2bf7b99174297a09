mod grouping;

pub use grouping::{EntityTable, EntityTableGrouping, EntityTableGroupingGuard};
