//! Error types.
//!
//! [`Error`] is the single error type crossing crate boundaries. Token and
//! transaction failures carry their own enums so callers can match on the
//! category without parsing messages.

use crate::types::{EdgeId, NodeId, TokenType, TxId};
use thiserror::Error;

/// Result alias used throughout graphdsl.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A node id does not denote a live node in the current snapshot.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// An edge id does not denote a live edge in the current snapshot.
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Token resolution or binding failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Transaction state error.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// A value had a different type than requested.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type name.
        expected: String,
        /// Found type name.
        found: String,
    },

    /// The store has been shut down.
    #[error("database is shut down")]
    DatabaseClosed,
}

/// Token errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The name cannot be used as a token.
    #[error("illegal {kind} name: {name:?}")]
    IllegalTokenName {
        /// Kind of the rejected token.
        kind: TokenType,
        /// The rejected name.
        name: String,
    },

    /// The store's table for this kind is full.
    #[error("too many tokens of kind {kind}: limit is {limit}")]
    TooManyTokens {
        /// Kind of the table that is full.
        kind: TokenType,
        /// The configured limit.
        limit: u32,
    },

    /// A token was used before any database bound it.
    #[error("{kind} token {name:?} is not bound")]
    TokenUnbound {
        /// Kind of the token.
        kind: TokenType,
        /// Name of the token.
        name: String,
    },

    /// A token is already bound to a different id.
    #[error("{kind} token {name:?} is bound to id {bound} and cannot be rebound to {requested}")]
    TokenAlreadyBound {
        /// Kind of the token.
        kind: TokenType,
        /// Name of the token.
        name: String,
        /// The id it holds.
        bound: u32,
        /// The id the store resolved.
        requested: u32,
    },
}

/// Transaction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The operation is not valid in the current state.
    #[error("invalid transaction state: {0}")]
    InvalidState(String),

    /// The transaction was closed, rolled back, or terminated by shutdown.
    #[error("transaction {0} has been closed or failed")]
    TransactionInvalidated(TxId),

    /// No read transaction is registered for the calling thread.
    #[error("no active transaction on the current thread")]
    NoActiveTransaction,
}
