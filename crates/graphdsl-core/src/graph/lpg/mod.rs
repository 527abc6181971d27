//! Labeled property graph storage.
//!
//! Records carry their creation and deletion epochs; a record is visible to
//! a snapshot taken at epoch `s` when it was created at or before `s` and
//! not deleted at or before `s`.

mod property;
mod store;
mod token;

pub use property::{EntityId, PropertyColumn, PropertyStorage};
pub use store::{LpgStore, LpgStoreConfig};
pub use token::TokenTable;

use graphdsl_common::types::{EdgeId, EdgeTypeId, EpochId, LabelId, NodeId};
use smallvec::SmallVec;

/// Storage record of a node.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Node id.
    pub id: NodeId,
    /// Label ids, in the order they were attached.
    pub labels: SmallVec<[LabelId; 4]>,
    /// Epoch that created the node.
    pub created_at: EpochId,
    /// Epoch that deleted the node, if any.
    pub deleted_at: Option<EpochId>,
}

impl NodeRecord {
    /// Creates a live record without labels.
    #[must_use]
    pub fn new(id: NodeId, epoch: EpochId) -> Self {
        Self {
            id,
            labels: SmallVec::new(),
            created_at: epoch,
            deleted_at: None,
        }
    }

    /// Attaches a label. Returns `false` if it was already present.
    pub fn add_label(&mut self, label: LabelId) -> bool {
        if self.labels.contains(&label) {
            return false;
        }
        self.labels.push(label);
        true
    }

    /// Detaches a label. Returns `false` if it was not present.
    pub fn remove_label(&mut self, label: LabelId) -> bool {
        match self.labels.iter().position(|&l| l == label) {
            Some(pos) => {
                self.labels.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the node carries the label.
    #[must_use]
    pub fn has_label(&self, label: LabelId) -> bool {
        self.labels.contains(&label)
    }

    /// Returns `true` once the node has been deleted at any epoch.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns `true` if a snapshot at `epoch` sees this node.
    #[must_use]
    pub fn is_visible_at(&self, epoch: EpochId) -> bool {
        self.created_at <= epoch && self.deleted_at.is_none_or(|deleted| deleted > epoch)
    }
}

/// Storage record of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    /// Edge id.
    pub id: EdgeId,
    /// Source node.
    pub src: NodeId,
    /// Destination node.
    pub dst: NodeId,
    /// Relationship type.
    pub type_id: EdgeTypeId,
    /// Epoch that created the edge.
    pub created_at: EpochId,
    /// Epoch that deleted the edge, if any.
    pub deleted_at: Option<EpochId>,
}

impl EdgeRecord {
    /// Creates a live edge record.
    #[must_use]
    pub fn new(id: EdgeId, src: NodeId, dst: NodeId, type_id: EdgeTypeId, epoch: EpochId) -> Self {
        Self {
            id,
            src,
            dst,
            type_id,
            created_at: epoch,
            deleted_at: None,
        }
    }

    /// Returns `true` once the edge has been deleted at any epoch.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns `true` if a snapshot at `epoch` sees this edge.
    #[must_use]
    pub fn is_visible_at(&self, epoch: EpochId) -> bool {
        self.created_at <= epoch && self.deleted_at.is_none_or(|deleted| deleted > epoch)
    }

    /// Returns `true` if source and destination are the same node.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.src == self.dst
    }
}

/// The read-side view of an edge handed out by transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipRecord {
    /// Edge id.
    pub id: EdgeId,
    /// Source node.
    pub start: NodeId,
    /// Destination node.
    pub end: NodeId,
    /// Relationship type.
    pub type_id: EdgeTypeId,
}

impl From<&EdgeRecord> for RelationshipRecord {
    fn from(record: &EdgeRecord) -> Self {
        Self {
            id: record.id,
            start: record.src,
            end: record.dst,
            type_id: record.type_id,
        }
    }
}
