//! Node and relationship handles.
//!
//! Handles are ids plus the statement they were read in. They hold no
//! entity state; every accessor reads the store through the statement, and
//! fails once the transaction is closed.

use crate::database::FromValue;
use crate::query::RelationshipStream;
use crate::read::ReadOperations;
use crate::token::{Label, PropertyName, RelType};
use graphdsl_common::types::{EdgeId, EdgeTypeId, LabelId, NodeId, Value};
use graphdsl_common::utils::error::Result;
use graphdsl_core::{Direction, RelationshipRecord};
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Property access shared by nodes and relationships.
pub trait Entity {
    /// Reads a property. `None` if the entity has no value for `key`.
    ///
    /// # Errors
    ///
    /// Fails if `key` is unbound, the entity does not exist in the
    /// transaction's snapshot, or the transaction is closed.
    fn property(&self, key: &PropertyName) -> Result<Option<Value>>;

    /// Reads a property converted to `T`.
    ///
    /// # Errors
    ///
    /// As [`property`](Self::property), plus `TypeMismatch` when the stored
    /// value has another type.
    fn property_as<T: FromValue>(&self, key: &PropertyName) -> Result<Option<T>> {
        self.property(key)?
            .map(|value| T::from_value(&value))
            .transpose()
    }
}

/// A node handle.
///
/// Equality and hashing use the id only.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    ops: ReadOperations,
}

impl Node {
    pub(crate) fn new(id: NodeId, ops: ReadOperations) -> Self {
        Self { id, ops }
    }

    /// Returns the node id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the node exists in the transaction's snapshot.
    pub fn exists(&self) -> Result<bool> {
        self.ops.node_exists(self.id)
    }

    /// Whether the node carries `label`.
    pub fn has_label(&self, label: &Label) -> Result<bool> {
        self.ops.node_has_label(self.id, label.resolve()?)
    }

    /// Label ids of the node.
    pub fn labels(&self) -> Result<SmallVec<[LabelId; 4]>> {
        self.ops.node_labels(self.id)
    }

    /// Label names of the node.
    pub fn label_names(&self) -> Result<Vec<Arc<str>>> {
        let mut names = Vec::new();
        for label in self.labels()? {
            if let Some(name) = self.ops.label_name(label)? {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// All relationships, outgoing first.
    #[must_use]
    pub fn rels(&self) -> RelationshipStream {
        self.rels_directed(Direction::Both, &[])
    }

    /// Relationships of any of `types`, outgoing first.
    #[must_use]
    pub fn rels_of_type(&self, types: &[&RelType]) -> RelationshipStream {
        self.rels_directed(Direction::Both, types)
    }

    /// Relationships in `direction` of any of `types`. An empty `types`
    /// matches every type.
    #[must_use]
    pub fn rels_directed(&self, direction: Direction, types: &[&RelType]) -> RelationshipStream {
        let mut ids: SmallVec<[EdgeTypeId; 4]> = SmallVec::with_capacity(types.len());
        let mut unbound = None;
        for rel_type in types {
            match rel_type.resolve() {
                Ok(id) => ids.push(id),
                Err(err) => {
                    unbound = Some(err);
                    break;
                }
            }
        }
        RelationshipStream::new(self.ops.clone(), self.id, direction, ids, unbound)
    }

    /// Number of relationships in `direction`.
    pub fn degree(&self, direction: Direction) -> Result<usize> {
        Ok(self
            .ops
            .node_relationships(self.id, direction, &[])?
            .len())
    }
}

impl Entity for Node {
    fn property(&self, key: &PropertyName) -> Result<Option<Value>> {
        self.ops.node_property(self.id, key.resolve()?)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Node").field(&self.id).finish()
    }
}

/// A relationship handle.
///
/// Equality and hashing use the id only.
#[derive(Clone)]
pub struct Relationship {
    record: RelationshipRecord,
    ops: ReadOperations,
}

impl Relationship {
    pub(crate) fn new(record: RelationshipRecord, ops: ReadOperations) -> Self {
        Self { record, ops }
    }

    /// Returns the relationship id.
    #[must_use]
    pub fn id(&self) -> EdgeId {
        self.record.id
    }

    /// The source node.
    #[must_use]
    pub fn start(&self) -> Node {
        Node::new(self.record.start, self.ops.clone())
    }

    /// The destination node.
    #[must_use]
    pub fn end(&self) -> Node {
        Node::new(self.record.end, self.ops.clone())
    }

    /// The relationship type id.
    #[must_use]
    pub fn rel_type(&self) -> EdgeTypeId {
        self.record.type_id
    }

    /// The relationship type name.
    pub fn rel_type_name(&self) -> Result<Option<Arc<str>>> {
        self.ops.relationship_type_name(self.record.type_id)
    }

    /// Whether this relationship has type `rel_type`. Unbound types never match.
    #[must_use]
    pub fn is_type(&self, rel_type: &RelType) -> bool {
        rel_type.try_ordinal() == Some(self.record.type_id)
    }

    /// The node at the other end from `node`, or `None` if `node` is not an
    /// endpoint. For a self-loop that is the node itself.
    #[must_use]
    pub fn other(&self, node: &Node) -> Option<Node> {
        if node.id() == self.record.start {
            Some(self.end())
        } else if node.id() == self.record.end {
            Some(self.start())
        } else {
            None
        }
    }
}

impl Entity for Relationship {
    fn property(&self, key: &PropertyName) -> Result<Option<Value>> {
        self.ops.relationship_property(self.record.id, key.resolve()?)
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.record.id == other.record.id
    }
}

impl Eq for Relationship {}

impl Hash for Relationship {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.record.id.hash(state);
    }
}

impl std::fmt::Debug for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relationship")
            .field("id", &self.record.id)
            .field("start", &self.record.start)
            .field("end", &self.record.end)
            .field("type", &self.record.type_id)
            .finish()
    }
}
