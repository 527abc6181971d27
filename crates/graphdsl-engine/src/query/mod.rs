//! Traversals.
//!
//! - [`matcher`] - Builders returned by the `match` entry points
//! - [`stream`] - Lazy node and relationship streams

pub mod matcher;
pub mod stream;

pub use matcher::{EntityStream, IdMatch, LabelMatch, MatchTarget, PropertyMatch};
pub use stream::{NodeStream, RelationshipStream};
