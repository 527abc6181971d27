//! Chunked adjacency lists.
//!
//! New entries land in the last chunk while it has room, otherwise in a
//! per-node delta buffer that is folded into fresh chunks once it grows past
//! a threshold. Entries are never removed: deleted edges stay listed and are
//! filtered by the store against the reader's snapshot, so an older snapshot
//! keeps seeing the edges it was taken with.
//!
//! Iteration order is insertion order.

use graphdsl_common::types::{EdgeId, NodeId};
use graphdsl_common::utils::hash::FxHashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

/// Default number of entries per chunk.
const DEFAULT_CHUNK_CAPACITY: usize = 64;

/// Delta buffer size that triggers compaction of a list.
const DELTA_COMPACTION_THRESHOLD: usize = 256;

#[derive(Debug, Clone)]
struct AdjacencyChunk {
    neighbors: Vec<NodeId>,
    edge_ids: Vec<EdgeId>,
    capacity: usize,
}

impl AdjacencyChunk {
    fn new(capacity: usize) -> Self {
        Self {
            neighbors: Vec::with_capacity(capacity),
            edge_ids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.neighbors.len() >= self.capacity
    }

    fn push(&mut self, neighbor: NodeId, edge_id: EdgeId) -> bool {
        if self.is_full() {
            return false;
        }
        self.neighbors.push(neighbor);
        self.edge_ids.push(edge_id);
        true
    }

    fn iter(&self) -> impl Iterator<Item = (NodeId, EdgeId)> + '_ {
        self.neighbors
            .iter()
            .copied()
            .zip(self.edge_ids.iter().copied())
    }
}

#[derive(Debug, Default)]
struct AdjacencyList {
    chunks: Vec<AdjacencyChunk>,
    // Non-empty only while the last chunk is full, which keeps insertion order.
    delta: SmallVec<[(NodeId, EdgeId); 8]>,
}

impl AdjacencyList {
    fn push(&mut self, neighbor: NodeId, edge_id: EdgeId) {
        if self.delta.is_empty() {
            if let Some(last) = self.chunks.last_mut() {
                if last.push(neighbor, edge_id) {
                    return;
                }
            }
        }
        self.delta.push((neighbor, edge_id));
    }

    fn compact(&mut self, chunk_capacity: usize) {
        if self.delta.is_empty() {
            return;
        }

        let mut current = match self.chunks.pop() {
            Some(last) if !last.is_full() => last,
            Some(last) => {
                self.chunks.push(last);
                AdjacencyChunk::new(chunk_capacity)
            }
            None => AdjacencyChunk::new(chunk_capacity),
        };

        for (neighbor, edge_id) in self.delta.drain(..) {
            if !current.push(neighbor, edge_id) {
                self.chunks.push(current);
                current = AdjacencyChunk::new(chunk_capacity);
                current.push(neighbor, edge_id);
            }
        }
        self.chunks.push(current);
    }

    fn iter(&self) -> impl Iterator<Item = (NodeId, EdgeId)> + '_ {
        self.chunks
            .iter()
            .flat_map(AdjacencyChunk::iter)
            .chain(self.delta.iter().copied())
    }
}

/// Adjacency lists keyed by node, one direction.
pub struct ChunkedAdjacency {
    lists: RwLock<FxHashMap<NodeId, AdjacencyList>>,
    chunk_capacity: usize,
}

impl ChunkedAdjacency {
    /// Creates an empty adjacency with the default chunk capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_capacity(DEFAULT_CHUNK_CAPACITY)
    }

    /// Creates an empty adjacency with a custom chunk capacity.
    #[must_use]
    pub fn with_chunk_capacity(capacity: usize) -> Self {
        Self {
            lists: RwLock::new(FxHashMap::default()),
            chunk_capacity: capacity.max(1),
        }
    }

    /// Records `edge_id` as leading from `node` to `neighbor`.
    pub fn add_edge(&self, node: NodeId, neighbor: NodeId, edge_id: EdgeId) {
        let mut lists = self.lists.write();
        let list = lists.entry(node).or_default();
        list.push(neighbor, edge_id);
        if list.delta.len() >= DELTA_COMPACTION_THRESHOLD {
            list.compact(self.chunk_capacity);
        }
    }

    /// Returns `(neighbor, edge)` pairs of `node` in insertion order.
    #[must_use]
    pub fn edges_from(&self, node: NodeId) -> Vec<(NodeId, EdgeId)> {
        self.lists
            .read()
            .get(&node)
            .map(|list| list.iter().collect())
            .unwrap_or_default()
    }
}

impl Default for ChunkedAdjacency {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_from_keeps_insertion_order() {
        let adj = ChunkedAdjacency::new();

        adj.add_edge(NodeId::new(0), NodeId::new(3), EdgeId::new(10));
        adj.add_edge(NodeId::new(0), NodeId::new(1), EdgeId::new(11));
        adj.add_edge(NodeId::new(0), NodeId::new(2), EdgeId::new(12));

        let edges = adj.edges_from(NodeId::new(0));
        assert_eq!(
            edges,
            vec![
                (NodeId::new(3), EdgeId::new(10)),
                (NodeId::new(1), EdgeId::new(11)),
                (NodeId::new(2), EdgeId::new(12)),
            ]
        );
        assert!(adj.edges_from(NodeId::new(1)).is_empty());
    }

    #[test]
    fn test_automatic_compaction() {
        let adj = ChunkedAdjacency::with_chunk_capacity(8);
        let n = DELTA_COMPACTION_THRESHOLD as u64 * 2 + 5;
        for i in 0..n {
            adj.add_edge(NodeId::new(0), NodeId::new(1), EdgeId::new(i));
        }

        let ids: Vec<u64> = adj
            .edges_from(NodeId::new(0))
            .into_iter()
            .map(|(_, e)| e.as_raw())
            .collect();
        assert_eq!(ids, (0..n).collect::<Vec<_>>());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_insertion_order_is_kept(
                ops in prop::collection::vec(0u64..3, 0..900),
                chunk in 1usize..16,
            ) {
                let adj = ChunkedAdjacency::with_chunk_capacity(chunk);
                let mut expected: Vec<Vec<u64>> = vec![Vec::new(); 3];
                for (edge, &node) in ops.iter().enumerate() {
                    adj.add_edge(NodeId::new(node), NodeId::new(0), EdgeId::new(edge as u64));
                    expected[node as usize].push(edge as u64);
                }
                for (node, want) in expected.iter().enumerate() {
                    let got: Vec<u64> = adj
                        .edges_from(NodeId::new(node as u64))
                        .into_iter()
                        .map(|(_, e)| e.as_raw())
                        .collect();
                    prop_assert_eq!(&got, want);
                }
            }
        }
    }
}
