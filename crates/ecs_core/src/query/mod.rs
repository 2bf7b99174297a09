mod query;

pub use query::EntityQuery;
