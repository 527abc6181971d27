//! Read transactions.

use crate::graph::Direction;
use crate::graph::lpg::{LpgStore, RelationshipRecord};
use graphdsl_common::types::{
    EdgeId, EdgeTypeId, EpochId, LabelId, NodeId, PropertyKeyId, TokenType, TxId, Value,
};
use graphdsl_common::utils::error::{Result, TransactionError};
use graphdsl_common::utils::hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// A read-only view of the store at a fixed epoch.
///
/// Every read fails with [`TransactionError::TransactionInvalidated`] once
/// the transaction was committed, rolled back, or terminated by shutdown.
/// Dropping an open transaction rolls it back.
pub struct ReadTransaction {
    store: Arc<LpgStore>,
    tx_id: TxId,
    snapshot: EpochId,
}

impl ReadTransaction {
    pub(crate) fn new(store: Arc<LpgStore>, tx_id: TxId, snapshot: EpochId) -> Self {
        Self {
            store,
            tx_id,
            snapshot,
        }
    }

    /// Returns the transaction id.
    #[must_use]
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Returns the snapshot epoch.
    #[must_use]
    pub fn snapshot(&self) -> EpochId {
        self.snapshot
    }

    /// Returns the store this transaction reads.
    #[must_use]
    pub fn store(&self) -> &Arc<LpgStore> {
        &self.store
    }

    /// Returns `true` while the transaction is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.store.tx_manager().is_active(self.tx_id)
    }

    /// Fails unless the transaction is open.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`].
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(TransactionError::TransactionInvalidated(self.tx_id).into())
        }
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it is not open.
    pub fn commit(&self) -> Result<()> {
        self.store.tx_manager().commit(self.tx_id)
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::TransactionInvalidated`] if it is not open.
    pub fn rollback(&self) -> Result<()> {
        self.store.tx_manager().abort(self.tx_id)
    }

    /// Ids of the nodes carrying `label`, ascending.
    pub fn nodes_for_label(&self, label: LabelId) -> Result<std::vec::IntoIter<NodeId>> {
        self.ensure_active()?;
        Ok(self.store.nodes_for_label_at(label, self.snapshot).into_iter())
    }

    /// Ids of all nodes, ascending.
    pub fn all_nodes(&self) -> Result<std::vec::IntoIter<NodeId>> {
        self.ensure_active()?;
        Ok(self.store.all_nodes_at(self.snapshot).into_iter())
    }

    /// Returns `true` if the node exists in this snapshot.
    pub fn node_exists(&self, node: NodeId) -> Result<bool> {
        self.ensure_active()?;
        Ok(self.store.node_visible_at(node, self.snapshot))
    }

    /// Returns `true` if the node carries `label`. Fails with `NodeNotFound`
    /// for nodes outside this snapshot.
    pub fn node_has_label(&self, node: NodeId, label: LabelId) -> Result<bool> {
        self.ensure_active()?;
        self.store.node_has_label_at(node, label, self.snapshot)
    }

    /// Labels of a node in the order they were attached.
    pub fn node_labels(&self, node: NodeId) -> Result<SmallVec<[LabelId; 4]>> {
        self.ensure_active()?;
        self.store.node_labels_at(node, self.snapshot)
    }

    /// A node property; `None` if the node has no value for `key`.
    pub fn node_property(&self, node: NodeId, key: PropertyKeyId) -> Result<Option<Value>> {
        self.ensure_active()?;
        self.store.node_property_at(node, key, self.snapshot)
    }

    /// Nodes whose `key` equals `value` according to the property index, or
    /// `None` when `key` is not indexed. Callers still check visibility.
    pub fn nodes_with_property(
        &self,
        key: PropertyKeyId,
        value: &Value,
    ) -> Result<Option<FxHashSet<NodeId>>> {
        self.ensure_active()?;
        Ok(self.store.property_index_lookup(key, value))
    }

    /// Relationships of a node. An empty `types` slice matches every type.
    pub fn node_relationships(
        &self,
        node: NodeId,
        direction: Direction,
        types: &[EdgeTypeId],
    ) -> Result<Vec<RelationshipRecord>> {
        self.ensure_active()?;
        self.store.edges_of_at(node, direction, types, self.snapshot)
    }

    /// A relationship by id.
    pub fn relationship(&self, edge: EdgeId) -> Result<RelationshipRecord> {
        self.ensure_active()?;
        self.store.edge_at(edge, self.snapshot)
    }

    /// A relationship property.
    pub fn relationship_property(&self, edge: EdgeId, key: PropertyKeyId) -> Result<Option<Value>> {
        self.ensure_active()?;
        self.store.edge_property_at(edge, key, self.snapshot)
    }

    /// Name of a token.
    pub fn token_name(&self, kind: TokenType, id: u32) -> Result<Option<Arc<str>>> {
        self.ensure_active()?;
        Ok(self.store.token_name(kind, id))
    }

    /// Name of a label.
    pub fn label_name(&self, label: LabelId) -> Result<Option<Arc<str>>> {
        self.token_name(TokenType::Label, label.as_raw())
    }

    /// Name of a relationship type.
    pub fn relationship_type_name(&self, rel_type: EdgeTypeId) -> Result<Option<Arc<str>>> {
        self.token_name(TokenType::RelationshipType, rel_type.as_raw())
    }
}

impl Drop for ReadTransaction {
    fn drop(&mut self) {
        if self.store.tx_manager().abort(self.tx_id).is_ok() {
            tracing::trace!(tx_id = %self.tx_id, "rolled back read transaction on drop");
        }
    }
}

impl std::fmt::Debug for ReadTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadTransaction")
            .field("tx_id", &self.tx_id)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}
