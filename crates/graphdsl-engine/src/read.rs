//! Read operations of the calling thread's statement.

use crate::context;
use graphdsl_common::types::{EdgeId, EdgeTypeId, LabelId, NodeId, PropertyKeyId, TxId, Value};
use graphdsl_common::utils::error::Result;
use graphdsl_common::utils::hash::FxHashSet;
use graphdsl_core::{Direction, ReadTransaction, RelationshipRecord};
use smallvec::SmallVec;
use std::rc::Rc;
use std::sync::Arc;

/// Shared handle to a statement's read operations.
///
/// Cloning is cheap. Every operation fails once the transaction is closed.
#[derive(Clone)]
pub struct ReadOperations {
    tx: Rc<ReadTransaction>,
}

impl ReadOperations {
    pub(crate) fn new(tx: Rc<ReadTransaction>) -> Self {
        Self { tx }
    }

    /// Looks up the statement registered for database `db` on this thread.
    pub(crate) fn current(db: u64) -> Result<Self> {
        context::current(db).map(Self::new)
    }

    /// Returns the id of the underlying transaction.
    #[must_use]
    pub fn tx_id(&self) -> TxId {
        self.tx.tx_id()
    }

    /// Fails unless the transaction is open.
    pub fn ensure_active(&self) -> Result<()> {
        self.tx.ensure_active()
    }

    /// Ids of the nodes carrying `label`, ascending.
    pub fn nodes_for_label(&self, label: LabelId) -> Result<std::vec::IntoIter<NodeId>> {
        self.tx.nodes_for_label(label)
    }

    /// Ids of all nodes, ascending.
    pub fn all_nodes(&self) -> Result<std::vec::IntoIter<NodeId>> {
        self.tx.all_nodes()
    }

    /// Whether the node exists in the transaction's snapshot.
    pub fn node_exists(&self, node: NodeId) -> Result<bool> {
        self.tx.node_exists(node)
    }

    /// Whether the node carries `label`.
    pub fn node_has_label(&self, node: NodeId, label: LabelId) -> Result<bool> {
        self.tx.node_has_label(node, label)
    }

    /// Labels of the node.
    pub fn node_labels(&self, node: NodeId) -> Result<SmallVec<[LabelId; 4]>> {
        self.tx.node_labels(node)
    }

    /// A node property.
    pub fn node_property(&self, node: NodeId, key: PropertyKeyId) -> Result<Option<Value>> {
        self.tx.node_property(node, key)
    }

    /// Indexed equality lookup; `None` if `key` has no index.
    pub fn nodes_with_property(
        &self,
        key: PropertyKeyId,
        value: &Value,
    ) -> Result<Option<FxHashSet<NodeId>>> {
        self.tx.nodes_with_property(key, value)
    }

    /// Relationships of a node.
    pub fn node_relationships(
        &self,
        node: NodeId,
        direction: Direction,
        types: &[EdgeTypeId],
    ) -> Result<Vec<RelationshipRecord>> {
        self.tx.node_relationships(node, direction, types)
    }

    /// A relationship.
    pub fn relationship(&self, edge: EdgeId) -> Result<RelationshipRecord> {
        self.tx.relationship(edge)
    }

    /// A relationship property.
    pub fn relationship_property(&self, edge: EdgeId, key: PropertyKeyId) -> Result<Option<Value>> {
        self.tx.relationship_property(edge, key)
    }

    /// Name of a label.
    pub fn label_name(&self, label: LabelId) -> Result<Option<Arc<str>>> {
        self.tx.label_name(label)
    }

    /// Name of a relationship type.
    pub fn relationship_type_name(&self, rel_type: EdgeTypeId) -> Result<Option<Arc<str>>> {
        self.tx.relationship_type_name(rel_type)
    }
}

impl std::fmt::Debug for ReadOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadOperations").field(&self.tx_id()).finish()
    }
}
