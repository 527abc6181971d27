//! Equality index over node property values.

use graphdsl_common::types::{NodeId, Value};
use graphdsl_common::utils::hash::{FxHashMap, FxHashSet};
use std::hash::{Hash, Hasher};

/// A [`Value`] usable as a hash key.
///
/// Equality follows `Value`'s own `==`. Floats hash by bit pattern with
/// `-0.0` folded into `0.0` so equal values hash equally. Values containing
/// NaN are never equal to anything and are rejected by [`HashableValue::new`].
#[derive(Debug, Clone)]
pub struct HashableValue(Value);

impl HashableValue {
    /// Wraps a value, or returns `None` if it contains NaN.
    #[must_use]
    pub fn new(value: Value) -> Option<Self> {
        if contains_nan(&value) {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Returns the wrapped value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }
}

fn contains_nan(value: &Value) -> bool {
    match value {
        Value::Float64(f) => f.is_nan(),
        Value::List(items) => items.iter().any(contains_nan),
        _ => false,
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Int64(i) => i.hash(state),
        Value::Float64(f) => {
            let normalized = if *f == 0.0 { 0.0f64 } else { *f };
            normalized.to_bits().hash(state);
        }
        Value::String(s) => s.hash(state),
        Value::List(items) => {
            items.len().hash(state);
            for item in items.iter() {
                hash_value(item, state);
            }
        }
    }
}

impl PartialEq for HashableValue {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for HashableValue {}

impl Hash for HashableValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

/// Value to node-set index for a single property key.
#[derive(Debug, Default)]
pub struct PropertyIndex {
    entries: FxHashMap<HashableValue, FxHashSet<NodeId>>,
}

impl PropertyIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node` under `value`. NaN values are not indexed.
    pub fn insert(&mut self, value: &Value, node: NodeId) {
        if let Some(key) = HashableValue::new(value.clone()) {
            self.entries.entry(key).or_default().insert(node);
        }
    }

    /// Removes `node` from under `value`.
    pub fn remove(&mut self, value: &Value, node: NodeId) {
        let Some(key) = HashableValue::new(value.clone()) else {
            return;
        };
        if let Some(nodes) = self.entries.get_mut(&key) {
            nodes.remove(&node);
            if nodes.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    /// Returns the nodes indexed under `value`.
    #[must_use]
    pub fn get(&self, value: &Value) -> FxHashSet<NodeId> {
        HashableValue::new(value.clone())
            .and_then(|key| self.entries.get(&key).cloned())
            .unwrap_or_default()
    }

    /// Number of distinct indexed values.
    #[must_use]
    pub fn distinct_values(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut index = PropertyIndex::new();
        index.insert(&Value::from("Alice"), NodeId::new(1));
        index.insert(&Value::from("Alice"), NodeId::new(2));
        index.insert(&Value::from("Bob"), NodeId::new(3));

        assert_eq!(index.get(&Value::from("Alice")).len(), 2);
        assert_eq!(index.distinct_values(), 2);

        index.remove(&Value::from("Bob"), NodeId::new(3));
        assert!(index.get(&Value::from("Bob")).is_empty());
        assert_eq!(index.distinct_values(), 1);
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        let mut index = PropertyIndex::new();
        index.insert(&Value::Float64(-0.0), NodeId::new(1));
        assert!(index.get(&Value::Float64(0.0)).contains(&NodeId::new(1)));
    }

    #[test]
    fn test_nan_is_never_indexed() {
        let mut index = PropertyIndex::new();
        index.insert(&Value::Float64(f64::NAN), NodeId::new(1));
        assert_eq!(index.distinct_values(), 0);
        assert!(index.get(&Value::Float64(f64::NAN)).is_empty());
        assert!(HashableValue::new(Value::from(vec![Value::Float64(f64::NAN)])).is_none());
    }

    #[test]
    fn test_int_and_float_are_distinct_keys() {
        let mut index = PropertyIndex::new();
        index.insert(&Value::Int64(1), NodeId::new(1));
        assert!(index.get(&Value::Float64(1.0)).is_empty());
    }
}
