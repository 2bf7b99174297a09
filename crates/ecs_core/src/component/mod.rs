mod component;

pub use component::{ComponentType, ComponentTypeCategory};
