//! # graphdsl-core
//!
//! Core layer for graphdsl: the in-memory labeled property graph store the
//! DSL reads from.
//!
//! This crate provides the storage contract the DSL consumes: token
//! get-or-create per kind, label scans, full scans, property and
//! relationship lookups, and read/write transactions. It depends only on
//! `graphdsl-common`.
//!
//! ## Modules
//!
//! - [`graph`] - The LPG store, records, token tables, property storage
//! - [`index`] - Adjacency and property-value indexes
//! - [`transaction`] - Transaction manager and read/write transaction handles

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod graph;
pub mod index;
pub mod transaction;

// Re-export commonly used types
pub use graph::Direction;
pub use graph::lpg::{LpgStore, LpgStoreConfig, RelationshipRecord};
pub use transaction::{ReadTransaction, TransactionManager, TxMode, WriteTransaction};
