//! Traversal builders.
//!
//! Builders only record what to read. Token ordinals are copied when a
//! builder is made; an unbound token is kept as a pending error and
//! reported by the stream's first item.

use super::stream::{NodeStream, PropertyFilter, Source};
use crate::database::Database;
use crate::token::{Label, PropertyName};
use graphdsl_common::types::{LabelId, NodeId, Value};
use graphdsl_common::utils::error::Error;
use smallvec::SmallVec;

/// A builder that can be turned into a stream.
pub trait EntityStream {
    /// The stream produced.
    type Stream: Iterator;

    /// Consumes the builder into its stream.
    fn stream(self) -> Self::Stream;
}

/// Nodes given by id.
#[derive(Debug)]
pub struct IdMatch<'db> {
    db: &'db Database,
    ids: Vec<NodeId>,
}

impl<'db> IdMatch<'db> {
    pub(crate) fn new(db: &'db Database, ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            db,
            ids: ids.into_iter().collect(),
        }
    }

    /// Streams one handle per id, in argument order, duplicates included.
    /// Ids are not checked: a missing node surfaces when a handle is read.
    #[must_use]
    pub fn stream(self) -> NodeStream {
        NodeStream::new(self.db.stream_context(), Source::Ids(self.ids), None, None)
    }
}

impl EntityStream for IdMatch<'_> {
    type Stream = NodeStream;

    fn stream(self) -> NodeStream {
        IdMatch::stream(self)
    }
}

/// Nodes carrying any of a list of labels.
#[derive(Debug)]
pub struct LabelMatch<'db> {
    db: &'db Database,
    labels: SmallVec<[LabelId; 4]>,
    unbound: Option<Error>,
}

impl<'db> LabelMatch<'db> {
    pub(crate) fn new<'l>(db: &'db Database, labels: impl IntoIterator<Item = &'l Label>) -> Self {
        let mut ids = SmallVec::new();
        let mut unbound = None;
        for label in labels {
            match label.resolve() {
                Ok(id) => ids.push(id),
                Err(err) => {
                    unbound.get_or_insert(err);
                }
            }
        }
        Self {
            db,
            labels: ids,
            unbound,
        }
    }

    /// Narrows to nodes whose `key` equals `value`.
    #[must_use]
    pub fn property(self, key: &PropertyName, value: impl Into<Value>) -> PropertyMatch<'db> {
        let (key, unbound) = match key.resolve() {
            Ok(id) => (id, self.unbound),
            Err(err) => (key.ordinal(), self.unbound.or(Some(err))),
        };
        PropertyMatch {
            db: self.db,
            labels: self.labels,
            filter: PropertyFilter::new(key, value.into()),
            unbound,
        }
    }

    /// Streams the nodes of each label in argument order, ascending id
    /// within a label. A node with several of the labels appears once per
    /// label.
    #[must_use]
    pub fn stream(self) -> NodeStream {
        NodeStream::new(
            self.db.stream_context(),
            Source::Labels(self.labels),
            None,
            self.unbound,
        )
    }
}

impl EntityStream for LabelMatch<'_> {
    type Stream = NodeStream;

    fn stream(self) -> NodeStream {
        LabelMatch::stream(self)
    }
}

/// A label match narrowed by a property equality.
#[derive(Debug)]
pub struct PropertyMatch<'db> {
    db: &'db Database,
    labels: SmallVec<[LabelId; 4]>,
    filter: PropertyFilter,
    unbound: Option<Error>,
}

impl PropertyMatch<'_> {
    /// Streams the label match's nodes whose property equals the value, in
    /// the label match's order. Uses the property's index when it has one.
    #[must_use]
    pub fn stream(self) -> NodeStream {
        NodeStream::new(
            self.db.stream_context(),
            Source::Labels(self.labels),
            Some(self.filter),
            self.unbound,
        )
    }
}

impl EntityStream for PropertyMatch<'_> {
    type Stream = NodeStream;

    fn stream(self) -> NodeStream {
        PropertyMatch::stream(self)
    }
}

/// Anything [`Database::r#match`] accepts.
pub trait MatchTarget<'db> {
    /// The builder produced.
    type Match;

    /// Builds the match over `db`.
    fn into_match(self, db: &'db Database) -> Self::Match;
}

impl<'db> MatchTarget<'db> for NodeId {
    type Match = IdMatch<'db>;

    fn into_match(self, db: &'db Database) -> IdMatch<'db> {
        IdMatch::new(db, [self])
    }
}

impl<'db> MatchTarget<'db> for u64 {
    type Match = IdMatch<'db>;

    fn into_match(self, db: &'db Database) -> IdMatch<'db> {
        IdMatch::new(db, [NodeId::new(self)])
    }
}

impl<'db> MatchTarget<'db> for &[NodeId] {
    type Match = IdMatch<'db>;

    fn into_match(self, db: &'db Database) -> IdMatch<'db> {
        IdMatch::new(db, self.iter().copied())
    }
}

impl<'db, const N: usize> MatchTarget<'db> for [NodeId; N] {
    type Match = IdMatch<'db>;

    fn into_match(self, db: &'db Database) -> IdMatch<'db> {
        IdMatch::new(db, self)
    }
}

impl<'db> MatchTarget<'db> for Vec<NodeId> {
    type Match = IdMatch<'db>;

    fn into_match(self, db: &'db Database) -> IdMatch<'db> {
        IdMatch::new(db, self)
    }
}

impl<'db> MatchTarget<'db> for &Label {
    type Match = LabelMatch<'db>;

    fn into_match(self, db: &'db Database) -> LabelMatch<'db> {
        LabelMatch::new(db, [self])
    }
}

impl<'db> MatchTarget<'db> for &[&Label] {
    type Match = LabelMatch<'db>;

    fn into_match(self, db: &'db Database) -> LabelMatch<'db> {
        LabelMatch::new(db, self.iter().copied())
    }
}

impl<'db, const N: usize> MatchTarget<'db> for [&Label; N] {
    type Match = LabelMatch<'db>;

    fn into_match(self, db: &'db Database) -> LabelMatch<'db> {
        LabelMatch::new(db, self)
    }
}
