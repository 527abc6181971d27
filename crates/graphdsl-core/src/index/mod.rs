//! Secondary structures maintained alongside the store.
//!
//! - [`adjacency`] - Per-node outgoing and incoming edge lists
//! - [`property`] - Equality index on node property values

pub mod adjacency;
pub mod property;

pub use adjacency::ChunkedAdjacency;
pub use property::{HashableValue, PropertyIndex};
