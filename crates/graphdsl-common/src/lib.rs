//! # graphdsl-common
//!
//! Foundation layer for graphdsl: ids, values, token kinds, and errors.
//!
//! This crate provides the fundamental building blocks used by all other
//! graphdsl crates. It has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions (NodeId, EdgeId, token ids, Value)
//! - [`utils`] - Utility functions and helpers (hashing, errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{EdgeId, EdgeTypeId, EpochId, LabelId, NodeId, PropertyKeyId, TokenType, TxId, Value};
pub use utils::error::{Error, Result, TokenError, TransactionError};
