//! The in-memory LPG store.
//!
//! ## Lock order
//!
//! Locks are always taken in this order and released before going back up:
//!
//! 1. `nodes`
//! 2. `label_index`
//! 3. `property_indexes`
//! 4. property columns
//! 5. `edges`
//!
//! The adjacency lists are leaves: they are read or written with at most
//! `nodes` held and never while `edges` is held.
//!
//! ## Versioning
//!
//! Node and edge existence is versioned by epoch. Every mutation that
//! creates or deletes a record advances the epoch while holding the `nodes`
//! write lock, and a read snapshot is taken under the `nodes` read lock.
//! Deleted records are kept as tombstones so older snapshots still resolve
//! them. Labels and properties are not versioned: a reader sees their latest
//! value.

use super::{EdgeRecord, NodeRecord, PropertyStorage, RelationshipRecord, TokenTable};
use crate::graph::Direction;
use crate::index::{ChunkedAdjacency, PropertyIndex};
use crate::transaction::{ReadTransaction, TransactionManager, TxMode, WriteTransaction};
use graphdsl_common::types::{
    EdgeId, EdgeTypeId, EpochId, LabelId, NodeId, PropertyKeyId, TokenType, Value,
};
use graphdsl_common::utils::error::{Error, Result};
use graphdsl_common::utils::hash::{FxHashMap, FxHashSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Configuration for the LPG store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LpgStoreConfig {
    /// Whether to maintain incoming adjacency lists. Without them incoming
    /// relationships are found by scanning all edges.
    pub backward_edges: bool,
    /// Initial capacity for nodes.
    pub initial_node_capacity: usize,
    /// Initial capacity for edges.
    pub initial_edge_capacity: usize,
    /// Maximum number of labels.
    pub max_labels: u32,
    /// Maximum number of relationship types.
    pub max_relationship_types: u32,
    /// Maximum number of property keys.
    pub max_property_keys: u32,
}

impl Default for LpgStoreConfig {
    fn default() -> Self {
        Self {
            backward_edges: true,
            initial_node_capacity: 1024,
            initial_edge_capacity: 4096,
            max_labels: 1 << 16,
            max_relationship_types: 1 << 16,
            max_property_keys: 1 << 24,
        }
    }
}

impl LpgStoreConfig {
    /// Returns the token limit for `kind`.
    #[must_use]
    pub fn token_limit(&self, kind: TokenType) -> u32 {
        match kind {
            TokenType::Label => self.max_labels,
            TokenType::RelationshipType => self.max_relationship_types,
            TokenType::PropertyKey => self.max_property_keys,
        }
    }

    /// Sets the token limit for `kind`.
    pub fn set_token_limit(&mut self, kind: TokenType, limit: u32) {
        match kind {
            TokenType::Label => self.max_labels = limit,
            TokenType::RelationshipType => self.max_relationship_types = limit,
            TokenType::PropertyKey => self.max_property_keys = limit,
        }
    }
}

/// The labeled property graph store.
///
/// All methods take `&self`; the store is meant to be shared behind an
/// [`Arc`]. Seeding methods mutate directly and are visible to read
/// transactions started afterwards. Reads go through [`ReadTransaction`].
pub struct LpgStore {
    config: LpgStoreConfig,

    nodes: RwLock<FxHashMap<NodeId, NodeRecord>>,
    edges: RwLock<FxHashMap<EdgeId, EdgeRecord>>,

    node_properties: PropertyStorage<NodeId>,
    edge_properties: PropertyStorage<EdgeId>,

    labels: TokenTable,
    edge_types: TokenTable,
    property_keys: TokenTable,

    forward_adj: ChunkedAdjacency,
    backward_adj: Option<ChunkedAdjacency>,

    /// Label to nodes. Deleted nodes stay listed until their label is removed.
    label_index: RwLock<FxHashMap<LabelId, FxHashSet<NodeId>>>,

    property_indexes: RwLock<FxHashMap<PropertyKeyId, PropertyIndex>>,

    tx_manager: TransactionManager,

    next_node_id: AtomicU64,
    next_edge_id: AtomicU64,
    current_epoch: AtomicU64,
    open: AtomicBool,
}

impl LpgStore {
    /// Creates a store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LpgStoreConfig::default())
    }

    /// Creates a store with custom configuration.
    #[must_use]
    pub fn with_config(config: LpgStoreConfig) -> Self {
        let backward_adj = if config.backward_edges {
            Some(ChunkedAdjacency::new())
        } else {
            None
        };

        Self {
            nodes: RwLock::new(FxHashMap::with_capacity_and_hasher(
                config.initial_node_capacity,
                Default::default(),
            )),
            edges: RwLock::new(FxHashMap::with_capacity_and_hasher(
                config.initial_edge_capacity,
                Default::default(),
            )),
            node_properties: PropertyStorage::new(),
            edge_properties: PropertyStorage::new(),
            labels: TokenTable::new(TokenType::Label, config.max_labels),
            edge_types: TokenTable::new(
                TokenType::RelationshipType,
                config.max_relationship_types,
            ),
            property_keys: TokenTable::new(TokenType::PropertyKey, config.max_property_keys),
            forward_adj: ChunkedAdjacency::new(),
            backward_adj,
            label_index: RwLock::new(FxHashMap::default()),
            property_indexes: RwLock::new(FxHashMap::default()),
            tx_manager: TransactionManager::new(),
            next_node_id: AtomicU64::new(0),
            next_edge_id: AtomicU64::new(0),
            current_epoch: AtomicU64::new(0),
            open: AtomicBool::new(true),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LpgStoreConfig {
        &self.config
    }

    /// Returns the current epoch.
    #[must_use]
    pub fn current_epoch(&self) -> EpochId {
        EpochId::new(self.current_epoch.load(Ordering::Acquire))
    }

    fn new_epoch(&self) -> EpochId {
        let id = self.current_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        EpochId::new(id)
    }

    // === Lifecycle ===

    /// Returns `true` until [`shutdown`](Self::shutdown) is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::DatabaseClosed)
        }
    }

    /// Closes the store and terminates every open transaction.
    ///
    /// Returns `false` if the store was already closed.
    pub fn shutdown(&self) -> bool {
        if !self.open.swap(false, Ordering::AcqRel) {
            return false;
        }
        let terminated = self.tx_manager.terminate_all();
        tracing::info!(terminated, "store shut down");
        true
    }

    pub(crate) fn tx_manager(&self) -> &TransactionManager {
        &self.tx_manager
    }

    /// Returns the number of open transactions.
    #[must_use]
    pub fn active_transaction_count(&self) -> usize {
        self.tx_manager.active_count()
    }

    /// Starts a read transaction with a snapshot of the current epoch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseClosed`] after shutdown.
    pub fn begin_read(self: &Arc<Self>) -> Result<ReadTransaction> {
        self.ensure_open()?;
        let snapshot = {
            let _nodes = self.nodes.read();
            self.current_epoch()
        };
        let tx_id = self.tx_manager.begin(TxMode::Read);
        tracing::trace!(%tx_id, %snapshot, "began read transaction");
        Ok(ReadTransaction::new(Arc::clone(self), tx_id, snapshot))
    }

    /// Starts a write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseClosed`] after shutdown.
    pub fn begin_write(self: &Arc<Self>) -> Result<WriteTransaction> {
        self.ensure_open()?;
        let tx_id = self.tx_manager.begin(TxMode::Write);
        tracing::trace!(%tx_id, "began write transaction");
        Ok(WriteTransaction::new(Arc::clone(self), tx_id))
    }

    // === Tokens ===

    fn token_table(&self, kind: TokenType) -> &TokenTable {
        match kind {
            TokenType::Label => &self.labels,
            TokenType::RelationshipType => &self.edge_types,
            TokenType::PropertyKey => &self.property_keys,
        }
    }

    /// Returns the raw id for `name` in the table of `kind`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseClosed`] after shutdown, or a token error for
    /// illegal names and full tables.
    pub fn get_or_create_token(&self, kind: TokenType, name: &str) -> Result<u32> {
        self.ensure_open()?;
        self.token_table(kind).get_or_create(name)
    }

    /// Returns the label id for `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`get_or_create_token`](Self::get_or_create_token).
    pub fn label_get_or_create(&self, name: &str) -> Result<LabelId> {
        self.get_or_create_token(TokenType::Label, name)
            .map(LabelId::new)
    }

    /// Returns the relationship type id for `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`get_or_create_token`](Self::get_or_create_token).
    pub fn relationship_type_get_or_create(&self, name: &str) -> Result<EdgeTypeId> {
        self.get_or_create_token(TokenType::RelationshipType, name)
            .map(EdgeTypeId::new)
    }

    /// Returns the property key id for `name`, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`get_or_create_token`](Self::get_or_create_token).
    pub fn property_key_get_or_create(&self, name: &str) -> Result<PropertyKeyId> {
        self.get_or_create_token(TokenType::PropertyKey, name)
            .map(PropertyKeyId::new)
    }

    /// Returns the raw id of an existing token.
    #[must_use]
    pub fn token_id(&self, kind: TokenType, name: &str) -> Option<u32> {
        self.token_table(kind).id_of(name)
    }

    /// Returns the name of a token.
    #[must_use]
    pub fn token_name(&self, kind: TokenType, id: u32) -> Option<Arc<str>> {
        self.token_table(kind).name_of(id)
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    // === Node Operations ===

    /// Creates a node with the given labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseClosed`] after shutdown or a token error for a
    /// bad label name. No node is created on error.
    pub fn create_node(&self, labels: &[&str]) -> Result<NodeId> {
        self.ensure_open()?;
        let label_ids = labels
            .iter()
            .map(|label| self.label_get_or_create(label))
            .collect::<Result<SmallVec<[LabelId; 4]>>>()?;

        let id = NodeId::new(self.next_node_id.fetch_add(1, Ordering::Relaxed));

        let mut nodes = self.nodes.write();
        let mut record = NodeRecord::new(id, self.new_epoch());
        for &label in &label_ids {
            record.add_label(label);
        }

        let mut index = self.label_index.write();
        for &label in &record.labels {
            index.entry(label).or_default().insert(id);
        }
        drop(index);

        nodes.insert(id, record);
        Ok(id)
    }

    /// Creates a node with labels and properties.
    ///
    /// # Errors
    ///
    /// See [`create_node`](Self::create_node). Property keys are resolved
    /// before the node is created.
    pub fn create_node_with_props<K, V>(
        &self,
        labels: &[&str],
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> Result<NodeId>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.ensure_open()?;
        let properties = properties
            .into_iter()
            .map(|(key, value)| Ok((self.property_key_get_or_create(key.as_ref())?, value.into())))
            .collect::<Result<Vec<(PropertyKeyId, Value)>>>()?;

        let id = self.create_node(labels)?;
        for (key, value) in properties {
            self.write_node_property(id, key, value);
        }
        Ok(id)
    }

    fn live_node(&self, id: NodeId) -> Result<()> {
        match self.nodes.read().get(&id) {
            Some(record) if !record.is_deleted() => Ok(()),
            _ => Err(Error::NodeNotFound(id)),
        }
    }

    /// Adds a label to a node. Returns `false` if it already had it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] for missing or deleted nodes.
    pub fn add_label(&self, id: NodeId, label: &str) -> Result<bool> {
        self.ensure_open()?;
        let label = self.label_get_or_create(label)?;

        let mut nodes = self.nodes.write();
        let record = nodes
            .get_mut(&id)
            .filter(|r| !r.is_deleted())
            .ok_or(Error::NodeNotFound(id))?;
        if !record.add_label(label) {
            return Ok(false);
        }
        self.label_index.write().entry(label).or_default().insert(id);
        Ok(true)
    }

    /// Removes a label from a node. Returns `false` if it did not have it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] for missing or deleted nodes.
    pub fn remove_label(&self, id: NodeId, label: &str) -> Result<bool> {
        self.ensure_open()?;
        let Some(label) = self.labels.id_of(label).map(LabelId::new) else {
            self.live_node(id)?;
            return Ok(false);
        };

        let mut nodes = self.nodes.write();
        let record = nodes
            .get_mut(&id)
            .filter(|r| !r.is_deleted())
            .ok_or(Error::NodeNotFound(id))?;
        if !record.remove_label(label) {
            return Ok(false);
        }
        if let Some(set) = self.label_index.write().get_mut(&label) {
            set.remove(&id);
        }
        Ok(true)
    }

    /// Sets a node property, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] for missing or deleted nodes.
    pub fn set_node_property(
        &self,
        id: NodeId,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        self.ensure_open()?;
        let key = self.property_key_get_or_create(key)?;
        self.live_node(id)?;
        Ok(self.write_node_property(id, key, value.into()))
    }

    fn write_node_property(&self, id: NodeId, key: PropertyKeyId, value: Value) -> Option<Value> {
        let mut indexes = self.property_indexes.write();
        let previous = self.node_properties.set(id, key, value.clone());
        if let Some(index) = indexes.get_mut(&key) {
            if let Some(old) = &previous {
                index.remove(old, id);
            }
            index.insert(&value, id);
        }
        previous
    }

    /// Removes a node property, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] for missing or deleted nodes.
    pub fn remove_node_property(&self, id: NodeId, key: &str) -> Result<Option<Value>> {
        self.ensure_open()?;
        self.live_node(id)?;
        let Some(key) = self.property_keys.id_of(key).map(PropertyKeyId::new) else {
            return Ok(None);
        };

        let mut indexes = self.property_indexes.write();
        let removed = self.node_properties.remove(id, key);
        if let (Some(index), Some(old)) = (indexes.get_mut(&key), &removed) {
            index.remove(old, id);
        }
        Ok(removed)
    }

    /// Deletes a node together with its relationships.
    ///
    /// Returns `false` if the node does not exist or was already deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseClosed`] after shutdown.
    pub fn delete_node(&self, id: NodeId) -> Result<bool> {
        self.ensure_open()?;

        let mut nodes = self.nodes.write();
        let Some(record) = nodes.get_mut(&id).filter(|r| !r.is_deleted()) else {
            return Ok(false);
        };

        let epoch = self.new_epoch();
        record.deleted_at = Some(epoch);

        let incident = self.incident_edge_ids(id);
        let mut edges = self.edges.write();
        let mut detached = 0usize;
        for edge_id in incident {
            if let Some(edge) = edges.get_mut(&edge_id).filter(|e| !e.is_deleted()) {
                edge.deleted_at = Some(epoch);
                detached += 1;
            }
        }
        tracing::trace!(%id, detached, "deleted node");
        Ok(true)
    }

    fn incident_edge_ids(&self, id: NodeId) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self
            .forward_adj
            .edges_from(id)
            .into_iter()
            .map(|(_, e)| e)
            .collect();
        match &self.backward_adj {
            Some(backward) => ids.extend(backward.edges_from(id).into_iter().map(|(_, e)| e)),
            None => ids.extend(
                self.edges
                    .read()
                    .values()
                    .filter(|e| e.dst == id)
                    .map(|e| e.id),
            ),
        }
        ids
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes
            .read()
            .values()
            .filter(|r| !r.is_deleted())
            .count()
    }

    // === Edge Operations ===

    /// Creates an edge from `src` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] if either endpoint is missing or deleted.
    pub fn create_edge(&self, src: NodeId, dst: NodeId, edge_type: &str) -> Result<EdgeId> {
        self.ensure_open()?;
        let type_id = self.relationship_type_get_or_create(edge_type)?;

        let nodes = self.nodes.write();
        for endpoint in [src, dst] {
            if !nodes.get(&endpoint).is_some_and(|r| !r.is_deleted()) {
                return Err(Error::NodeNotFound(endpoint));
            }
        }

        let id = EdgeId::new(self.next_edge_id.fetch_add(1, Ordering::Relaxed));
        let record = EdgeRecord::new(id, src, dst, type_id, self.new_epoch());
        self.edges.write().insert(id, record);

        self.forward_adj.add_edge(src, dst, id);
        if let Some(backward) = &self.backward_adj {
            backward.add_edge(dst, src, id);
        }
        drop(nodes);

        Ok(id)
    }

    /// Creates an edge with properties.
    ///
    /// # Errors
    ///
    /// See [`create_edge`](Self::create_edge).
    pub fn create_edge_with_props<K, V>(
        &self,
        src: NodeId,
        dst: NodeId,
        edge_type: &str,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> Result<EdgeId>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.ensure_open()?;
        let properties = properties
            .into_iter()
            .map(|(key, value)| Ok((self.property_key_get_or_create(key.as_ref())?, value.into())))
            .collect::<Result<Vec<(PropertyKeyId, Value)>>>()?;

        let id = self.create_edge(src, dst, edge_type)?;
        for (key, value) in properties {
            self.edge_properties.set(id, key, value);
        }
        Ok(id)
    }

    /// Sets an edge property, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EdgeNotFound`] for missing or deleted edges.
    pub fn set_edge_property(
        &self,
        id: EdgeId,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        self.ensure_open()?;
        let key = self.property_key_get_or_create(key)?;
        if !self.edges.read().get(&id).is_some_and(|e| !e.is_deleted()) {
            return Err(Error::EdgeNotFound(id));
        }
        Ok(self.edge_properties.set(id, key, value.into()))
    }

    /// Deletes an edge. Returns `false` if it does not exist or was already deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseClosed`] after shutdown.
    pub fn delete_edge(&self, id: EdgeId) -> Result<bool> {
        self.ensure_open()?;
        let _nodes = self.nodes.write();
        let mut edges = self.edges.write();
        let Some(record) = edges.get_mut(&id).filter(|e| !e.is_deleted()) else {
            return Ok(false);
        };
        record.deleted_at = Some(self.new_epoch());
        Ok(true)
    }

    /// Returns the number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges
            .read()
            .values()
            .filter(|r| !r.is_deleted())
            .count()
    }

    // === Property Indexes ===

    /// Creates an equality index on a node property and fills it from
    /// existing values. Creating an existing index is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatabaseClosed`] after shutdown or a token error for
    /// a bad key name.
    pub fn create_property_index(&self, key: &str) -> Result<PropertyKeyId> {
        self.ensure_open()?;
        let key_id = self.property_key_get_or_create(key)?;

        let mut indexes = self.property_indexes.write();
        if indexes.contains_key(&key_id) {
            return Ok(key_id);
        }

        let mut index = PropertyIndex::new();
        for (node, value) in self.node_properties.entries(key_id) {
            index.insert(&value, node);
        }
        tracing::info!(key, distinct_values = index.distinct_values(), "created property index");
        indexes.insert(key_id, index);
        Ok(key_id)
    }

    /// Drops an index. Returns `true` if it existed.
    pub fn drop_property_index(&self, key: &str) -> bool {
        let Some(key_id) = self.property_keys.id_of(key).map(PropertyKeyId::new) else {
            return false;
        };
        self.property_indexes.write().remove(&key_id).is_some()
    }

    /// Returns `true` if the property key is indexed.
    #[must_use]
    pub fn has_property_index(&self, key: &str) -> bool {
        self.property_keys
            .id_of(key)
            .is_some_and(|id| self.property_indexes.read().contains_key(&PropertyKeyId::new(id)))
    }

    // === Snapshot reads ===
    //
    // Node id sets are collected and sorted under the read lock, so a stream
    // sees the members of its snapshot even when writers change the index.

    pub(crate) fn nodes_for_label_at(&self, label: LabelId, epoch: EpochId) -> Vec<NodeId> {
        let nodes = self.nodes.read();
        let index = self.label_index.read();
        let Some(members) = index.get(&label) else {
            return Vec::new();
        };
        let mut ids: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|id| nodes.get(id).is_some_and(|r| r.is_visible_at(epoch)))
            .collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn all_nodes_at(&self, epoch: EpochId) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .read()
            .values()
            .filter(|r| r.is_visible_at(epoch))
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn node_visible_at(&self, id: NodeId, epoch: EpochId) -> bool {
        self.nodes
            .read()
            .get(&id)
            .is_some_and(|r| r.is_visible_at(epoch))
    }

    pub(crate) fn node_labels_at(
        &self,
        id: NodeId,
        epoch: EpochId,
    ) -> Result<SmallVec<[LabelId; 4]>> {
        self.nodes
            .read()
            .get(&id)
            .filter(|r| r.is_visible_at(epoch))
            .map(|r| r.labels.clone())
            .ok_or(Error::NodeNotFound(id))
    }

    pub(crate) fn node_has_label_at(
        &self,
        id: NodeId,
        label: LabelId,
        epoch: EpochId,
    ) -> Result<bool> {
        self.nodes
            .read()
            .get(&id)
            .filter(|r| r.is_visible_at(epoch))
            .map(|r| r.has_label(label))
            .ok_or(Error::NodeNotFound(id))
    }

    pub(crate) fn node_property_at(
        &self,
        id: NodeId,
        key: PropertyKeyId,
        epoch: EpochId,
    ) -> Result<Option<Value>> {
        if !self.node_visible_at(id, epoch) {
            return Err(Error::NodeNotFound(id));
        }
        Ok(self.node_properties.get(id, key))
    }

    pub(crate) fn property_index_lookup(
        &self,
        key: PropertyKeyId,
        value: &Value,
    ) -> Option<FxHashSet<NodeId>> {
        self.property_indexes
            .read()
            .get(&key)
            .map(|index| index.get(value))
    }

    /// Relationships of `id` visible at `epoch`: outgoing first, then
    /// incoming, each in creation order. A self-loop is listed once when both
    /// directions are requested. An empty `types` slice matches every type.
    pub(crate) fn edges_of_at(
        &self,
        id: NodeId,
        direction: Direction,
        types: &[EdgeTypeId],
        epoch: EpochId,
    ) -> Result<Vec<RelationshipRecord>> {
        if !self.node_visible_at(id, epoch) {
            return Err(Error::NodeNotFound(id));
        }

        let outgoing = if direction.includes_outgoing() {
            self.forward_adj.edges_from(id)
        } else {
            Vec::new()
        };
        let incoming = if direction.includes_incoming() {
            match &self.backward_adj {
                Some(backward) => backward.edges_from(id),
                None => self.scan_incoming(id),
            }
        } else {
            Vec::new()
        };

        let edges = self.edges.read();
        let wanted = |record: &&EdgeRecord| {
            record.is_visible_at(epoch) && (types.is_empty() || types.contains(&record.type_id))
        };

        let mut result: Vec<RelationshipRecord> = outgoing
            .iter()
            .filter_map(|(_, edge_id)| edges.get(edge_id))
            .filter(wanted)
            .map(RelationshipRecord::from)
            .collect();
        result.extend(
            incoming
                .iter()
                .filter_map(|(_, edge_id)| edges.get(edge_id))
                .filter(wanted)
                .filter(|record| !(direction == Direction::Both && record.is_loop()))
                .map(RelationshipRecord::from),
        );
        Ok(result)
    }

    fn scan_incoming(&self, id: NodeId) -> Vec<(NodeId, EdgeId)> {
        let mut incoming: Vec<(NodeId, EdgeId)> = self
            .edges
            .read()
            .values()
            .filter(|e| e.dst == id)
            .map(|e| (e.src, e.id))
            .collect();
        incoming.sort_unstable_by_key(|&(_, edge_id)| edge_id);
        incoming
    }

    pub(crate) fn edge_at(&self, id: EdgeId, epoch: EpochId) -> Result<RelationshipRecord> {
        self.edges
            .read()
            .get(&id)
            .filter(|e| e.is_visible_at(epoch))
            .map(RelationshipRecord::from)
            .ok_or(Error::EdgeNotFound(id))
    }

    pub(crate) fn edge_property_at(
        &self,
        id: EdgeId,
        key: PropertyKeyId,
        epoch: EpochId,
    ) -> Result<Option<Value>> {
        self.edge_at(id, epoch)?;
        Ok(self.edge_properties.get(id, key))
    }
}

impl Default for LpgStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphdsl_common::utils::error::TokenError;

    fn visible_ids(store: &Arc<LpgStore>) -> Vec<NodeId> {
        store.all_nodes_at(store.current_epoch())
    }

    #[test]
    fn test_create_node_and_label_scan() {
        let store = LpgStore::new();

        let p1 = store.create_node(&["Person"]).unwrap();
        let _a = store.create_node(&["Animal"]).unwrap();
        let p2 = store.create_node(&["Person", "Person"]).unwrap();

        let person = store.label_get_or_create("Person").unwrap();
        let persons = store.nodes_for_label_at(person, store.current_epoch());
        assert_eq!(persons, vec![p1, p2]);
        assert_eq!(
            store.node_labels_at(p2, store.current_epoch()).unwrap().len(),
            1
        );
        assert_eq!(store.label_count(), 2);
    }

    #[test]
    fn test_token_ids_are_per_kind() {
        let store = LpgStore::new();
        assert_eq!(store.label_get_or_create("X").unwrap(), LabelId::new(0));
        assert_eq!(
            store.relationship_type_get_or_create("X").unwrap(),
            EdgeTypeId::new(0)
        );
        assert_eq!(
            store.property_key_get_or_create("X").unwrap(),
            PropertyKeyId::new(0)
        );
        assert_eq!(store.token_id(TokenType::Label, "X"), Some(0));
        assert_eq!(
            store.token_name(TokenType::PropertyKey, 0).as_deref(),
            Some("X")
        );
    }

    #[test]
    fn test_token_limit_from_config() {
        let mut config = LpgStoreConfig::default();
        config.set_token_limit(TokenType::Label, 1);
        let store = LpgStore::with_config(config);

        store.label_get_or_create("A").unwrap();
        let err = store.create_node(&["B"]).unwrap_err();
        assert!(matches!(
            err,
            Error::Token(TokenError::TooManyTokens { limit: 1, .. })
        ));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_delete_node_keeps_old_snapshot() {
        let store = Arc::new(LpgStore::new());

        let a = store.create_node(&["Person"]).unwrap();
        let b = store.create_node(&["Person"]).unwrap();
        let before = store.current_epoch();

        assert!(store.delete_node(a).unwrap());
        assert!(!store.delete_node(a).unwrap());
        assert_eq!(store.node_count(), 1);

        let person = store.label_get_or_create("Person").unwrap();
        assert_eq!(store.nodes_for_label_at(person, before), vec![a, b]);
        assert_eq!(visible_ids(&store), vec![b]);
        assert!(matches!(
            store.node_has_label_at(a, person, store.current_epoch()),
            Err(Error::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_delete_node_detaches_edges() {
        let store = LpgStore::new();
        let a = store.create_node(&[]).unwrap();
        let b = store.create_node(&[]).unwrap();
        store.create_edge(a, b, "KNOWS").unwrap();
        store.create_edge(b, a, "KNOWS").unwrap();
        assert_eq!(store.edge_count(), 2);

        store.delete_node(a).unwrap();
        assert_eq!(store.edge_count(), 0);
        let rels = store
            .edges_of_at(b, Direction::Both, &[], store.current_epoch())
            .unwrap();
        assert!(rels.is_empty());
    }

    #[test]
    fn test_create_edge_requires_live_endpoints() {
        let store = LpgStore::new();
        let a = store.create_node(&[]).unwrap();
        let err = store.create_edge(a, NodeId::new(99), "KNOWS").unwrap_err();
        assert_eq!(err, Error::NodeNotFound(NodeId::new(99)));
    }

    #[test]
    fn test_edges_of_direction_and_type() {
        let store = LpgStore::new();
        let a = store.create_node(&[]).unwrap();
        let b = store.create_node(&[]).unwrap();
        let c = store.create_node(&[]).unwrap();

        let ab = store.create_edge(a, b, "KNOWS").unwrap();
        let ca = store.create_edge(c, a, "KNOWS").unwrap();
        let ac = store.create_edge(a, c, "LIKES").unwrap();
        let aa = store.create_edge(a, a, "KNOWS").unwrap();

        let epoch = store.current_epoch();
        let ids = |dir, types: &[EdgeTypeId]| -> Vec<EdgeId> {
            store
                .edges_of_at(a, dir, types, epoch)
                .unwrap()
                .into_iter()
                .map(|r| r.id)
                .collect()
        };

        assert_eq!(ids(Direction::Outgoing, &[]), vec![ab, ac, aa]);
        assert_eq!(ids(Direction::Incoming, &[]), vec![ca, aa]);
        assert_eq!(ids(Direction::Both, &[]), vec![ab, ac, aa, ca]);

        let knows = store.relationship_type_get_or_create("KNOWS").unwrap();
        assert_eq!(ids(Direction::Both, &[knows]), vec![ab, aa, ca]);
    }

    #[test]
    fn test_incoming_without_backward_adjacency() {
        let config = LpgStoreConfig {
            backward_edges: false,
            ..LpgStoreConfig::default()
        };
        let store = LpgStore::with_config(config);
        let a = store.create_node(&[]).unwrap();
        let b = store.create_node(&[]).unwrap();
        let e1 = store.create_edge(a, b, "R").unwrap();
        let e2 = store.create_edge(a, b, "R").unwrap();

        let incoming: Vec<EdgeId> = store
            .edges_of_at(b, Direction::Incoming, &[], store.current_epoch())
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(incoming, vec![e1, e2]);
    }

    #[test]
    fn test_deleted_edge_visible_to_older_snapshot() {
        let store = LpgStore::new();
        let a = store.create_node(&[]).unwrap();
        let b = store.create_node(&[]).unwrap();
        let e = store.create_edge(a, b, "R").unwrap();
        let before = store.current_epoch();

        assert!(store.delete_edge(e).unwrap());
        assert!(store.edge_at(e, before).is_ok());
        assert_eq!(
            store.edge_at(e, store.current_epoch()),
            Err(Error::EdgeNotFound(e))
        );
    }

    #[test]
    fn test_property_index_tracks_updates() {
        let store = LpgStore::new();
        let a = store
            .create_node_with_props(&["Person"], [("name", "Alice")])
            .unwrap();
        let key = store.create_property_index("name").unwrap();
        assert!(store.has_property_index("name"));

        let b = store.create_node(&["Person"]).unwrap();
        store.set_node_property(b, "name", "Alice").unwrap();
        let hits = store
            .property_index_lookup(key, &Value::from("Alice"))
            .unwrap();
        assert_eq!(hits.len(), 2);

        store.set_node_property(a, "name", "Bob").unwrap();
        store.remove_node_property(b, "name").unwrap();
        assert!(
            store
                .property_index_lookup(key, &Value::from("Alice"))
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .property_index_lookup(key, &Value::from("Bob"))
                .unwrap()
                .contains(&a)
        );

        assert!(store.drop_property_index("name"));
        assert!(store.property_index_lookup(key, &Value::Null).is_none());
    }

    #[test]
    fn test_remove_label_updates_scan() {
        let store = LpgStore::new();
        let a = store.create_node(&["Person"]).unwrap();
        assert!(store.remove_label(a, "Person").unwrap());
        assert!(!store.remove_label(a, "Unknown").unwrap());

        let person = store.label_get_or_create("Person").unwrap();
        assert!(
            store
                .nodes_for_label_at(person, store.current_epoch())
                .is_empty()
        );
    }

    #[test]
    fn test_shutdown_rejects_mutations() {
        let store = Arc::new(LpgStore::new());
        let tx = store.begin_read().unwrap();

        assert!(store.shutdown());
        assert!(!store.shutdown());
        assert!(!store.is_open());
        assert!(!tx.is_active());
        assert_eq!(store.create_node(&[]), Err(Error::DatabaseClosed));
        assert!(matches!(store.begin_read(), Err(Error::DatabaseClosed)));
    }
}
