//! # graphdsl-engine
//!
//! The query DSL: tokens, binding, transactions, traversal builders, and
//! lazy streams over a [`graphdsl_core::LpgStore`].
//!
//! ## Modules
//!
//! - [`token`] - Symbolic labels, relationship types, and property keys
//! - [`binder`] - Binds token groups to store ids
//! - [`database`] - The DSL root and its lifecycle
//! - [`context`] - Per-thread transaction context
//! - [`read`] - Reads within the current statement
//! - [`entity`] - Node and relationship handles
//! - [`query`] - Traversal builders and streams
//! - [`config`] - Configuration options

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod binder;
pub mod config;
pub mod context;
pub mod database;
pub mod entity;
pub mod query;
pub mod read;
pub mod token;

pub use binder::BindingSummary;
pub use config::Config;
pub use context::Transaction;
pub use database::{Database, FromValue};
pub use entity::{Entity, Node, Relationship};
pub use graphdsl_core::Direction;
pub use query::{
    EntityStream, IdMatch, LabelMatch, MatchTarget, NodeStream, PropertyMatch, RelationshipStream,
};
pub use token::{AnyToken, Label, PropertyName, RelType, Token, TokenGroup};
