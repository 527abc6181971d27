//! Token kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a symbolic token.
///
/// Kinds partition the token namespace: a label and a property key may
/// share a numeric id without ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Node label.
    Label,
    /// Relationship type.
    RelationshipType,
    /// Property key.
    PropertyKey,
}

impl TokenType {
    /// Returns a human readable name for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenType::Label => "label",
            TokenType::RelationshipType => "relationship type",
            TokenType::PropertyKey => "property key",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
