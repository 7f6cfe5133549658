//! Domain layer: value objects and aggregates of a bulk upload
pub mod aggregates;
pub mod value_objects;
