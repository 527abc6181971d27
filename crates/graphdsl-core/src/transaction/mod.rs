//! Transactions.
//!
//! The [`TransactionManager`] tracks which transactions are open. A
//! transaction is active from `begin` until it commits, aborts, or the store
//! shuts down; every operation on a handle first checks that it is still
//! active.

mod read;
mod write;

pub use read::ReadTransaction;
pub use write::WriteTransaction;

use graphdsl_common::types::TxId;
use graphdsl_common::utils::error::{Result, TransactionError};
use graphdsl_common::utils::hash::FxHashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Reads against a snapshot.
    Read,
    /// Token creation and writes.
    Write,
}

/// Tracks open transactions.
pub struct TransactionManager {
    /// Next id to hand out. Id 0 is reserved for the system.
    next_tx_id: AtomicU64,
    active: RwLock<FxHashMap<TxId, TxMode>>,
}

impl TransactionManager {
    /// Creates a manager with no open transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_tx_id: AtomicU64::new(1),
            active: RwLock::new(FxHashMap::default()),
        }
    }

    /// Registers a new transaction and returns its id.
    pub fn begin(&self, mode: TxMode) -> TxId {
        let id = TxId::new(self.next_tx_id.fetch_add(1, Ordering::Relaxed));
        self.active.write().insert(id, mode);
        id
    }

    /// Returns `true` if the transaction is open.
    #[must_use]
    pub fn is_active(&self, tx: TxId) -> bool {
        self.active.read().contains_key(&tx)
    }

    /// Commits an open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it is not open.
    pub fn commit(&self, tx: TxId) -> Result<()> {
        self.finish(tx)
    }

    /// Aborts an open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it is not open.
    pub fn abort(&self, tx: TxId) -> Result<()> {
        self.finish(tx)
    }

    fn finish(&self, tx: TxId) -> Result<()> {
        let mode = self
            .active
            .write()
            .remove(&tx)
            .ok_or(TransactionError::TransactionInvalidated(tx))?;
        tracing::trace!(%tx, ?mode, "transaction finished");
        Ok(())
    }

    /// Closes every open transaction. Returns how many were closed.
    pub fn terminate_all(&self) -> usize {
        let mut active = self.active.write();
        let count = active.len();
        active.clear();
        count
    }

    /// Returns the number of open transactions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
