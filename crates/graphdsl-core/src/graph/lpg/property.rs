//! Columnar property storage.
//!
//! Each property key id owns a column mapping entity ids to values, so a
//! filter on one key only touches that key's column.

use graphdsl_common::types::{EdgeId, NodeId, PropertyKeyId, Value};
use graphdsl_common::utils::hash::FxHashMap;
use parking_lot::RwLock;
use std::hash::Hash;
use std::marker::PhantomData;

/// Entity ids usable as property storage keys.
pub trait EntityId: Copy + Eq + Hash + 'static {}

impl EntityId for NodeId {}
impl EntityId for EdgeId {}

/// Property columns for one entity kind.
pub struct PropertyStorage<Id: EntityId = NodeId> {
    columns: RwLock<FxHashMap<PropertyKeyId, PropertyColumn<Id>>>,
    _marker: PhantomData<Id>,
}

impl<Id: EntityId> PropertyStorage<Id> {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: RwLock::new(FxHashMap::default()),
            _marker: PhantomData,
        }
    }

    /// Sets a value, returning the previous one.
    pub fn set(&self, id: Id, key: PropertyKeyId, value: Value) -> Option<Value> {
        let mut columns = self.columns.write();
        columns.entry(key).or_default().set(id, value)
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, id: Id, key: PropertyKeyId) -> Option<Value> {
        self.columns.read().get(&key).and_then(|col| col.get(id))
    }

    /// Removes a value, returning it.
    pub fn remove(&self, id: Id, key: PropertyKeyId) -> Option<Value> {
        self.columns
            .write()
            .get_mut(&key)
            .and_then(|col| col.remove(id))
    }

    /// Returns all `(id, value)` pairs in the column for `key`.
    #[must_use]
    pub fn entries(&self, key: PropertyKeyId) -> Vec<(Id, Value)> {
        self.columns.read().get(&key).map_or_else(Vec::new, |col| {
            col.iter().map(|(id, value)| (id, value.clone())).collect()
        })
    }
}

impl<Id: EntityId> Default for PropertyStorage<Id> {
    fn default() -> Self {
        Self::new()
    }
}

/// Values of one property key across entities.
pub struct PropertyColumn<Id: EntityId = NodeId> {
    values: FxHashMap<Id, Value>,
}

impl<Id: EntityId> PropertyColumn<Id> {
    /// Creates an empty column.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: FxHashMap::default(),
        }
    }

    /// Sets a value, returning the previous one.
    pub fn set(&mut self, id: Id, value: Value) -> Option<Value> {
        self.values.insert(id, value)
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, id: Id) -> Option<Value> {
        self.values.get(&id).cloned()
    }

    /// Removes a value.
    pub fn remove(&mut self, id: Id) -> Option<Value> {
        self.values.remove(&id)
    }

    /// Iterates over `(id, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Value)> {
        self.values.iter().map(|(&id, v)| (id, v))
    }
}

impl<Id: EntityId> Default for PropertyColumn<Id> {
    fn default() -> Self {
        Self::new()
    }
}
