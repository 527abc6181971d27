//! # graphdsl
//!
//! A fluent, type-safe query DSL over an embeddable labeled property graph.
//!
//! Labels, relationship types, and property keys are declared once as
//! [`Token`]s and bound to the store's ids when a [`Database`] is built.
//! Queries are then plain method chains that stream node handles lazily
//! inside a per-thread [`Transaction`].
//!
//! ## Quick Start
//!
//! ```rust
//! use graphdsl::token::{LabelKind, PropertyKeyKind};
//! use graphdsl::{Database, Entity, token_group};
//!
//! token_group! {
//!     struct Labels: LabelKind {
//!         person => "Person",
//!     }
//! }
//!
//! token_group! {
//!     struct Props: PropertyKeyKind {
//!         name => "name",
//!     }
//! }
//!
//! let labels = Labels::new();
//! let props = Props::new();
//! let db = Database::open_in_memory(&[&labels, &props])?;
//!
//! db.store().create_node_with_props(&["Person"], [("name", "Alice")])?;
//! db.store().create_node_with_props(&["Person"], [("name", "Bob")])?;
//!
//! let tx = db.begin_tx()?;
//! let bobs = db
//!     .r#match(&labels.person)
//!     .property(&props.name, "Bob")
//!     .stream()
//!     .try_collect()?;
//! assert_eq!(bobs.len(), 1);
//! assert_eq!(bobs[0].property_as::<String>(&props.name)?.as_deref(), Some("Bob"));
//! tx.commit()?;
//! # Ok::<(), graphdsl::Error>(())
//! ```

pub use graphdsl_engine::token;
pub use graphdsl_engine::token_group;
pub use graphdsl_engine::{
    AnyToken, BindingSummary, Config, Database, Direction, Entity, EntityStream, FromValue,
    IdMatch, Label, LabelMatch, MatchTarget, Node, NodeStream, PropertyMatch, PropertyName,
    RelType, Relationship, RelationshipStream, Token, TokenGroup, Transaction,
};

// Store layer, for seeding and inspecting data
pub use graphdsl_core::{LpgStore, LpgStoreConfig};

// Ids, values, and errors
pub use graphdsl_common::types::{EdgeId, EdgeTypeId, LabelId, NodeId, PropertyKeyId, TokenType, Value};
pub use graphdsl_common::utils::error::{Error, Result, TokenError, TransactionError};
