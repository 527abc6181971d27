//! Graph model.

pub mod lpg;

use serde::{Deserialize, Serialize};

/// Traversal direction relative to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Edges whose source is the node.
    Outgoing,
    /// Edges whose destination is the node.
    Incoming,
    /// Both; outgoing first, then incoming.
    #[default]
    Both,
}

impl Direction {
    /// Returns `true` if outgoing edges are included.
    #[must_use]
    pub const fn includes_outgoing(self) -> bool {
        matches!(self, Direction::Outgoing | Direction::Both)
    }

    /// Returns `true` if incoming edges are included.
    #[must_use]
    pub const fn includes_incoming(self) -> bool {
        matches!(self, Direction::Incoming | Direction::Both)
    }
}
