//! Domain layer: entities and value-level helpers.

pub mod address;
pub mod entities;

pub use entities::*;
