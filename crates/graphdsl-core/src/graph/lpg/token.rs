//! Token tables.
//!
//! One table per token kind maps names to dense ids assigned in creation
//! order. Ids are never reused or renumbered, so an id handed out once stays
//! valid for the lifetime of the store.

use graphdsl_common::types::TokenType;
use graphdsl_common::utils::error::{Result, TokenError};
use graphdsl_common::utils::hash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Default)]
struct TokenTableInner {
    by_name: FxHashMap<Arc<str>, u32>,
    names: Vec<Arc<str>>,
}

/// Name to id table for one token kind.
pub struct TokenTable {
    kind: TokenType,
    limit: u32,
    inner: RwLock<TokenTableInner>,
}

impl TokenTable {
    /// Creates an empty table holding at most `limit` tokens.
    ///
    /// `u32::MAX` is the invalid id sentinel, so the limit is capped below it.
    #[must_use]
    pub fn new(kind: TokenType, limit: u32) -> Self {
        Self {
            kind,
            limit: limit.min(u32::MAX - 1),
            inner: RwLock::new(TokenTableInner::default()),
        }
    }

    /// Returns the kind of token this table holds.
    #[must_use]
    pub fn kind(&self) -> TokenType {
        self.kind
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the id for `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::IllegalTokenName`] for empty names or names
    /// containing NUL, and [`TokenError::TooManyTokens`] when the table is full.
    pub fn get_or_create(&self, name: &str) -> Result<u32> {
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.by_name.get(name) {
                return Ok(id);
            }
        }

        self.validate(name)?;

        let mut inner = self.inner.write();

        // Double-check after acquiring write lock
        if let Some(&id) = inner.by_name.get(name) {
            return Ok(id);
        }

        let id = inner.names.len() as u32;
        if id >= self.limit {
            return Err(TokenError::TooManyTokens {
                kind: self.kind,
                limit: self.limit,
            }
            .into());
        }

        let name: Arc<str> = name.into();
        inner.by_name.insert(Arc::clone(&name), id);
        inner.names.push(name);
        tracing::trace!(kind = %self.kind, id, "created token");

        Ok(id)
    }

    /// Returns the id for `name` without creating it.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.inner.read().by_name.get(name).copied()
    }

    /// Returns the name of `id`.
    #[must_use]
    pub fn name_of(&self, id: u32) -> Option<Arc<str>> {
        self.inner.read().names.get(id as usize).cloned()
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    /// Returns `true` if no token has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all names in id order.
    #[must_use]
    pub fn names(&self) -> Vec<Arc<str>> {
        self.inner.read().names.clone()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.contains('\0') {
            return Err(TokenError::IllegalTokenName {
                kind: self.kind,
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
