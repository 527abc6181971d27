//! The DSL root.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use graphdsl_common::types::{NodeId, Value};
use graphdsl_common::utils::error::{Error, Result};
use graphdsl_core::LpgStore;

use crate::binder::{BindingSummary, bind_tokens};
use crate::config::Config;
use crate::context::{self, Transaction};
use crate::query::stream::{Source, StreamContext};
use crate::query::{IdMatch, LabelMatch, MatchTarget, NodeStream};
use crate::token::{Label, TokenGroup};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(0);

/// A store with its tokens bound.
///
/// `Database` is `Send + Sync`. Reads need a transaction opened on the
/// reading thread with [`begin_tx`](Self::begin_tx); builders and streams
/// pick it up implicitly.
///
/// # Examples
///
/// ```
/// use graphdsl_engine::token::LabelKind;
/// use graphdsl_engine::{Database, token_group};
///
/// token_group! {
///     struct Labels: LabelKind {
///         person => "Person",
///     }
/// }
///
/// let labels = Labels::new();
/// let db = Database::open_in_memory(&[&labels]).unwrap();
/// db.store().create_node(&["Person"]).unwrap();
///
/// let tx = db.begin_tx().unwrap();
/// assert_eq!(db.r#match(&labels.person).stream().try_count().unwrap(), 1);
/// tx.commit().unwrap();
/// ```
pub struct Database {
    /// Database configuration.
    config: Config,
    /// The underlying graph store.
    store: Arc<LpgStore>,
    /// Key of this database's statements in the per-thread context.
    instance_id: u64,
    /// What the constructor bound.
    binding: BindingSummary,
    /// Whether the database is open.
    is_open: RwLock<bool>,
    /// Whether the store was created by this database and dies with it.
    owns_store: bool,
}

impl Database {
    /// Binds `groups` against an existing store.
    ///
    /// The store stays open when the database is dropped; only an explicit
    /// [`shutdown`](Self::shutdown) closes it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseClosed` if the store was shut down, or the first
    /// token error. No token is bound on error.
    pub fn new(store: Arc<LpgStore>, groups: &[&dyn TokenGroup]) -> Result<Self> {
        let config = Config {
            store: store.config().clone(),
            ..Config::default()
        };
        Self::with_store_and_config(store, config, groups)
    }

    /// Creates a store from `config` and binds `groups` against it. The store
    /// is shut down when the database is dropped.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_config(config: Config, groups: &[&dyn TokenGroup]) -> Result<Self> {
        let store = Arc::new(LpgStore::with_config(config.store.clone()));
        Self::open(store, config, groups, true)
    }

    /// Creates an in-memory database with default configuration.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn open_in_memory(groups: &[&dyn TokenGroup]) -> Result<Self> {
        Self::with_config(Config::in_memory(), groups)
    }

    /// Binds `groups` against an existing `store`, using `config` for the DSL
    /// settings. `config.store` is ignored. Dropping the database leaves the
    /// store open.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_store_and_config(
        store: Arc<LpgStore>,
        config: Config,
        groups: &[&dyn TokenGroup],
    ) -> Result<Self> {
        Self::open(store, config, groups, false)
    }

    fn open(
        store: Arc<LpgStore>,
        config: Config,
        groups: &[&dyn TokenGroup],
        owns_store: bool,
    ) -> Result<Self> {
        if !store.is_open() {
            return Err(Error::DatabaseClosed);
        }

        let binding = bind_tokens(&store, groups)?;
        for key in &config.property_indexes {
            store.create_property_index(key)?;
        }

        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            instance_id,
            tokens = binding.total(),
            owns_store,
            "database opened"
        );

        Ok(Self {
            config,
            store,
            instance_id,
            binding,
            is_open: RwLock::new(true),
            owns_store,
        })
    }

    /// Opens a read transaction on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseClosed` after shutdown, or `InvalidState` if this
    /// thread already has an open transaction on this database.
    pub fn begin_tx(&self) -> Result<Transaction> {
        if !self.is_open() {
            return Err(Error::DatabaseClosed);
        }
        let statement = context::register(self.instance_id, self.store.begin_read()?)?;
        Ok(Transaction::new(self.instance_id, statement))
    }

    /// Matches nodes by id.
    #[must_use]
    pub fn match_ids(&self, ids: impl IntoIterator<Item = NodeId>) -> IdMatch<'_> {
        IdMatch::new(self, ids)
    }

    /// Matches nodes by label.
    #[must_use]
    pub fn match_labels(&self, labels: &[&Label]) -> LabelMatch<'_> {
        LabelMatch::new(self, labels.iter().copied())
    }

    /// Matches ids or labels, whichever `target` is.
    #[must_use]
    pub fn r#match<'db, T: MatchTarget<'db>>(&'db self, target: T) -> T::Match {
        target.into_match(self)
    }

    /// Streams all nodes in ascending id order.
    #[must_use]
    pub fn stream(&self) -> NodeStream {
        NodeStream::new(self.stream_context(), Source::All, None, None)
    }

    pub(crate) fn stream_context(&self) -> StreamContext {
        StreamContext {
            db: self.instance_id,
            query_logging: self.config.query_logging,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<LpgStore> {
        &self.store
    }

    /// Returns what the constructor bound.
    #[must_use]
    pub fn binding(&self) -> BindingSummary {
        self.binding
    }

    /// Returns the per-thread context key of this database.
    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// Returns `true` until shutdown.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    /// Shuts the store down, invalidating every open transaction, stream, and
    /// handle, including those of other databases over the same store.
    /// Calling it again does nothing.
    pub fn shutdown(&self) {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return;
        }
        self.store.shutdown();
        *is_open = false;
        tracing::info!(instance_id = self.instance_id, "database shut down");
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.owns_store {
            self.shutdown();
        } else {
            *self.is_open.get_mut() = false;
            tracing::debug!(instance_id = self.instance_id, "database released");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("instance_id", &self.instance_id)
            .field("binding", &self.binding)
            .field("is_open", &self.is_open())
            .field("owns_store", &self.owns_store)
            .finish_non_exhaustive()
    }
}

/// Conversion from a property [`Value`].
pub trait FromValue: Sized {
    /// Converts from a Value.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value has another type.
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &str, value: &Value) -> Error {
    Error::TypeMismatch {
        expected: expected.to_string(),
        found: value.type_name().to_string(),
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_int64().ok_or_else(|| mismatch("INT64", value))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_float64().ok_or_else(|| mismatch("FLOAT64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| mismatch("STRING", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("BOOL", value))
    }
}
