//! Database configuration.

use graphdsl_common::types::TokenType;
use graphdsl_core::LpgStoreConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Database`](crate::Database).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration of the store created by [`Database::with_config`](crate::Database::with_config).
    pub store: LpgStoreConfig,
    /// Log each materialized stream at `info` instead of `debug`.
    pub query_logging: bool,
    /// Node property keys indexed when the database opens.
    pub property_indexes: Vec<String>,
}

impl Config {
    /// Creates the default in-memory configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Enables or disables query logging.
    #[must_use]
    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.query_logging = enabled;
        self
    }

    /// Adds a property key to index on open.
    #[must_use]
    pub fn with_property_index(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.property_indexes.contains(&key) {
            self.property_indexes.push(key);
        }
        self
    }

    /// Sets the maximum number of tokens of one kind.
    #[must_use]
    pub fn with_token_limit(mut self, kind: TokenType, limit: u32) -> Self {
        self.store.set_token_limit(kind, limit);
        self
    }

    /// Disables incoming adjacency lists.
    #[must_use]
    pub fn without_backward_edges(mut self) -> Self {
        self.store.backward_edges = false;
        self
    }
}
