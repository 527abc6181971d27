//! Core type definitions for graphdsl.
//!
//! This module contains all fundamental types used throughout the DSL:
//! - Entity identifiers ([`NodeId`], [`EdgeId`])
//! - Token identifiers ([`LabelId`], [`EdgeTypeId`], [`PropertyKeyId`]) and [`TokenType`]
//! - Transaction bookkeeping ([`TxId`], [`EpochId`])
//! - Property values ([`Value`])

mod id;
mod token;
mod value;

pub use id::{EdgeId, EdgeTypeId, EpochId, LabelId, NodeId, PropertyKeyId, TxId};
pub use token::TokenType;
pub use value::Value;
