//! Per-thread statement context.
//!
//! [`Database::begin_tx`](crate::Database::begin_tx) registers the new read
//! transaction in a thread-local map keyed by database instance. Streams look
//! their statement up here on first use, so building a traversal needs no
//! transaction and consuming one needs the caller's.
//!
//! Everything handed out holds an [`Rc`], which keeps statements, streams,
//! and handles on the thread that opened the transaction.

use graphdsl_common::types::TxId;
use graphdsl_common::utils::error::{Result, TransactionError};
use graphdsl_common::utils::hash::FxHashMap;
use graphdsl_core::ReadTransaction;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static STATEMENTS: RefCell<FxHashMap<u64, Rc<ReadTransaction>>> =
        RefCell::new(FxHashMap::default());
}

/// Registers `tx` as this thread's statement for database `db`.
///
/// A registered statement that is no longer active is replaced.
pub(crate) fn register(db: u64, tx: ReadTransaction) -> Result<Rc<ReadTransaction>> {
    STATEMENTS.with(|statements| {
        let mut statements = statements.borrow_mut();
        if statements.get(&db).is_some_and(|current| current.is_active()) {
            return Err(TransactionError::InvalidState(
                "Transaction already active".to_string(),
            )
            .into());
        }
        let statement = Rc::new(tx);
        statements.insert(db, Rc::clone(&statement));
        Ok(statement)
    })
}

/// Returns this thread's statement for database `db`.
pub(crate) fn current(db: u64) -> Result<Rc<ReadTransaction>> {
    STATEMENTS.with(|statements| {
        statements
            .borrow()
            .get(&db)
            .cloned()
            .ok_or_else(|| TransactionError::NoActiveTransaction.into())
    })
}

/// Removes the statement of database `db` if it is transaction `tx`.
pub(crate) fn deregister(db: u64, tx: TxId) {
    // Ignore access after the thread-local was torn down at thread exit
    let _ = STATEMENTS.try_with(|statements| {
        let mut statements = statements.borrow_mut();
        if statements.get(&db).is_some_and(|current| current.tx_id() == tx) {
            statements.remove(&db);
        }
    });
}

/// A read transaction bound to the calling thread.
///
/// Dropping an open transaction rolls it back. Either way the thread's
/// statement slot is freed, and streams or handles still referring to the
/// transaction fail with
/// [`TransactionInvalidated`](TransactionError::TransactionInvalidated).
pub struct Transaction {
    db: u64,
    statement: Rc<ReadTransaction>,
}

impl Transaction {
    pub(crate) fn new(db: u64, statement: Rc<ReadTransaction>) -> Self {
        Self { db, statement }
    }

    /// Returns the transaction id.
    #[must_use]
    pub fn tx_id(&self) -> TxId {
        self.statement.tx_id()
    }

    /// Returns `true` while the transaction is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.statement.is_active()
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it was already
    /// terminated, for instance by shutdown.
    pub fn commit(self) -> Result<()> {
        self.statement.commit()
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it was already
    /// terminated.
    pub fn rollback(self) -> Result<()> {
        self.statement.rollback()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.statement.is_active() {
            let _ = self.statement.rollback();
        }
        deregister(self.db, self.statement.tx_id());
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("db", &self.db)
            .field("tx_id", &self.tx_id())
            .finish()
    }
}
