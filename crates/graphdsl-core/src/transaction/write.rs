//! Write transactions.
//!
//! Token creation through a write transaction is not undone on rollback.
//! Token names are schema: created idempotently and visible to every
//! transaction as soon as they exist.

use crate::graph::lpg::LpgStore;
use graphdsl_common::types::{EdgeTypeId, LabelId, PropertyKeyId, TokenType, TxId};
use graphdsl_common::utils::error::{Result, TransactionError};
use std::sync::Arc;

/// A write transaction.
pub struct WriteTransaction {
    store: Arc<LpgStore>,
    tx_id: TxId,
}

impl WriteTransaction {
    pub(crate) fn new(store: Arc<LpgStore>, tx_id: TxId) -> Self {
        Self { store, tx_id }
    }

    /// Returns the transaction id.
    #[must_use]
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Returns `true` while the transaction is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.store.tx_manager().is_active(self.tx_id)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(TransactionError::TransactionInvalidated(self.tx_id).into())
        }
    }

    /// Returns the raw id of a token, creating it if needed.
    pub fn get_or_create_token(&self, kind: TokenType, name: &str) -> Result<u32> {
        self.ensure_active()?;
        self.store.get_or_create_token(kind, name)
    }

    /// Returns the id of a label, creating it if needed.
    pub fn label_get_or_create(&self, name: &str) -> Result<LabelId> {
        self.get_or_create_token(TokenType::Label, name)
            .map(LabelId::new)
    }

    /// Returns the id of a relationship type, creating it if needed.
    pub fn relationship_type_get_or_create(&self, name: &str) -> Result<EdgeTypeId> {
        self.get_or_create_token(TokenType::RelationshipType, name)
            .map(EdgeTypeId::new)
    }

    /// Returns the id of a property key, creating it if needed.
    pub fn property_key_get_or_create(&self, name: &str) -> Result<PropertyKeyId> {
        self.get_or_create_token(TokenType::PropertyKey, name)
            .map(PropertyKeyId::new)
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it was
    /// terminated in the meantime.
    pub fn commit(self) -> Result<()> {
        self.store.tx_manager().commit(self.tx_id)
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it was
    /// terminated in the meantime.
    pub fn rollback(self) -> Result<()> {
        self.store.tx_manager().abort(self.tx_id)
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        let _ = self.store.tx_manager().abort(self.tx_id);
    }
}

impl std::fmt::Debug for WriteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTransaction")
            .field("tx_id", &self.tx_id)
            .finish_non_exhaustive()
    }
}
