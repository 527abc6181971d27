//! Lazy result streams.
//!
//! A stream does no storage work until its first `next()`. It then looks up
//! the calling thread's statement, and every later item first checks that
//! the statement is still open. After the first error a stream only yields
//! `None`.

use crate::entity::{Node, Relationship};
use crate::read::ReadOperations;
use graphdsl_common::types::{EdgeTypeId, LabelId, NodeId, PropertyKeyId, Value};
use graphdsl_common::utils::error::{Error, Result};
use graphdsl_common::utils::hash::FxHashSet;
use graphdsl_core::{Direction, RelationshipRecord};
use smallvec::SmallVec;
use std::iter::FusedIterator;

/// Where a [`NodeStream`] takes its ids from.
#[derive(Debug, Clone)]
pub(crate) enum Source {
    Ids(Vec<NodeId>),
    Labels(SmallVec<[LabelId; 4]>),
    All,
}

impl Source {
    fn describe(&self) -> &'static str {
        match self {
            Source::Ids(_) => "ids",
            Source::Labels(_) => "labels",
            Source::All => "all nodes",
        }
    }
}

#[derive(Debug)]
enum IndexLookup {
    Pending,
    Indexed(FxHashSet<NodeId>),
    Unindexed,
}

/// Equality filter on one property.
#[derive(Debug)]
pub(crate) struct PropertyFilter {
    key: PropertyKeyId,
    value: Value,
    lookup: IndexLookup,
}

impl PropertyFilter {
    pub(crate) fn new(key: PropertyKeyId, value: Value) -> Self {
        Self {
            key,
            value,
            lookup: IndexLookup::Pending,
        }
    }

    fn matches(&mut self, ops: &ReadOperations, node: NodeId) -> Result<bool> {
        if matches!(self.lookup, IndexLookup::Pending) {
            self.lookup = match ops.nodes_with_property(self.key, &self.value)? {
                Some(hits) => IndexLookup::Indexed(hits),
                None => IndexLookup::Unindexed,
            };
        }
        match &self.lookup {
            IndexLookup::Indexed(hits) => Ok(hits.contains(&node)),
            _ => Ok(ops
                .node_property(node, self.key)?
                .is_some_and(|value| value == self.value)),
        }
    }
}

/// Settings a stream copies from its database.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StreamContext {
    pub(crate) db: u64,
    pub(crate) query_logging: bool,
}

enum Cursor {
    Pending,
    Ids(std::vec::IntoIter<NodeId>),
    Labels {
        labels: smallvec::IntoIter<[LabelId; 4]>,
        current: std::vec::IntoIter<NodeId>,
    },
    Done,
}

/// A lazy, single-pass, ordered sequence of nodes.
pub struct NodeStream {
    ctx: StreamContext,
    source: Option<Source>,
    filter: Option<PropertyFilter>,
    error: Option<Error>,
    ops: Option<ReadOperations>,
    cursor: Cursor,
    emitted: usize,
}

impl NodeStream {
    pub(crate) fn new(
        ctx: StreamContext,
        source: Source,
        filter: Option<PropertyFilter>,
        error: Option<Error>,
    ) -> Self {
        Self {
            ctx,
            source: Some(source),
            filter,
            error,
            ops: None,
            cursor: Cursor::Pending,
            emitted: 0,
        }
    }

    fn start(&mut self) -> Result<ReadOperations> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let ops = ReadOperations::current(self.ctx.db)?;
        ops.ensure_active()?;

        let source = self.source.take().unwrap_or(Source::All);
        let filtered = self.filter.is_some();
        if self.ctx.query_logging {
            tracing::info!(
                db = self.ctx.db,
                source = source.describe(),
                filtered,
                "materializing node stream"
            );
        } else {
            tracing::debug!(
                db = self.ctx.db,
                source = source.describe(),
                filtered,
                "materializing node stream"
            );
        }

        self.cursor = match source {
            Source::Ids(ids) => Cursor::Ids(ids.into_iter()),
            Source::Labels(labels) => Cursor::Labels {
                labels: labels.into_iter(),
                current: Vec::new().into_iter(),
            },
            Source::All => Cursor::Ids(ops.all_nodes()?),
        };
        Ok(ops)
    }

    fn advance(&mut self) -> Result<Option<Node>> {
        let ops = match &self.ops {
            Some(ops) => {
                ops.ensure_active()?;
                ops.clone()
            }
            None => {
                let ops = self.start()?;
                self.ops = Some(ops.clone());
                ops
            }
        };

        loop {
            let next = match &mut self.cursor {
                Cursor::Ids(ids) => ids.next(),
                Cursor::Labels { labels, current } => match current.next() {
                    Some(id) => Some(id),
                    None => match labels.next() {
                        Some(label) => {
                            *current = ops.nodes_for_label(label)?;
                            continue;
                        }
                        None => None,
                    },
                },
                Cursor::Pending | Cursor::Done => None,
            };

            let Some(id) = next else {
                self.finish();
                return Ok(None);
            };
            if let Some(filter) = &mut self.filter {
                if !filter.matches(&ops, id)? {
                    continue;
                }
            }
            self.emitted += 1;
            return Ok(Some(Node::new(id, ops)));
        }
    }

    fn finish(&mut self) {
        self.cursor = Cursor::Done;
        tracing::trace!(
            db = self.ctx.db,
            emitted = self.emitted,
            "node stream exhausted"
        );
    }

    /// Counts the remaining nodes.
    ///
    /// # Errors
    ///
    /// Returns the first error of the stream.
    pub fn try_count(mut self) -> Result<usize> {
        self.try_fold(0usize, |count, node| node.map(|_| count + 1))
    }

    /// Returns the next node, if any.
    ///
    /// # Errors
    ///
    /// Returns the stream's error if it fails first.
    pub fn first(mut self) -> Result<Option<Node>> {
        self.next().transpose()
    }

    /// Collects the remaining node ids.
    ///
    /// # Errors
    ///
    /// Returns the first error of the stream.
    pub fn ids(self) -> Result<Vec<NodeId>> {
        self.map(|node| node.map(|n| n.id())).collect()
    }

    /// Collects the remaining nodes.
    ///
    /// # Errors
    ///
    /// Returns the first error of the stream.
    pub fn try_collect(self) -> Result<Vec<Node>> {
        self.collect()
    }
}

impl Iterator for NodeStream {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.cursor, Cursor::Done) {
            return None;
        }
        match self.advance() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => None,
            Err(err) => {
                self.cursor = Cursor::Done;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for NodeStream {}

impl std::fmt::Debug for NodeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeStream")
            .field("db", &self.ctx.db)
            .field("source", &self.source)
            .field("filtered", &self.filter.is_some())
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}

/// A lazy sequence of a node's relationships.
pub struct RelationshipStream {
    ops: ReadOperations,
    node: NodeId,
    direction: Direction,
    types: SmallVec<[EdgeTypeId; 4]>,
    error: Option<Error>,
    records: Option<std::vec::IntoIter<RelationshipRecord>>,
    done: bool,
}

impl RelationshipStream {
    pub(crate) fn new(
        ops: ReadOperations,
        node: NodeId,
        direction: Direction,
        types: SmallVec<[EdgeTypeId; 4]>,
        error: Option<Error>,
    ) -> Self {
        Self {
            ops,
            node,
            direction,
            types,
            error,
            records: None,
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<Relationship>> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.ops.ensure_active()?;
        if self.records.is_none() {
            let records = self
                .ops
                .node_relationships(self.node, self.direction, &self.types)?;
            self.records = Some(records.into_iter());
        }
        let next = self.records.as_mut().and_then(Iterator::next);
        Ok(next.map(|record| Relationship::new(record, self.ops.clone())))
    }

    /// Counts the remaining relationships.
    ///
    /// # Errors
    ///
    /// Returns the first error of the stream.
    pub fn try_count(mut self) -> Result<usize> {
        self.try_fold(0usize, |count, rel| rel.map(|_| count + 1))
    }

    /// Collects the remaining relationships.
    ///
    /// # Errors
    ///
    /// Returns the first error of the stream.
    pub fn try_collect(self) -> Result<Vec<Relationship>> {
        self.collect()
    }
}

impl Iterator for RelationshipStream {
    type Item = Result<Relationship>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(rel)) => Some(Ok(rel)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for RelationshipStream {}

impl std::fmt::Debug for RelationshipStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipStream")
            .field("node", &self.node)
            .field("direction", &self.direction)
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}
