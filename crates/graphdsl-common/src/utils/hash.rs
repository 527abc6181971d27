//! Hash map and set aliases.
//!
//! All internal maps use `hashbrown` tables keyed with `ahash`. Keys are
//! ids and interned names, never attacker-controlled input, so a fast
//! non-cryptographic hasher is appropriate.

/// Fast hash map.
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// Fast hash set.
pub type FxHashSet<T> = hashbrown::HashSet<T, ahash::RandomState>;
