//! Document store contract.
//!
//! # Responsibility
//! - Define the get/query/commit primitives the policy and services run
//!   against.
//! - Express cross-document atomicity as versioned write batches.
//!
//! # Invariants
//! - `commit` is all-or-nothing: either every op in the batch applies or none
//!   does.
//! - Every update/delete carries the version the writer read; a mismatch at
//!   commit time is a `Conflict`, the optimistic-concurrency primitive the
//!   aggregation path retries on.
//! - Query results are ordered by creation, newest first.

use crate::policy::Collection;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite;

pub use sqlite::SqliteDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store failures.
#[derive(Debug)]
pub enum StoreError {
    /// A version precondition failed at commit time. Retriable.
    Conflict { collection: Collection, key: String },
    /// An insert targeted a key that already exists.
    KeyExists { collection: Collection, key: String },
    /// The store could not be reached or stayed busy past its timeout.
    Unavailable(String),
    /// A stored body failed to parse as JSON.
    InvalidData(String),
    Db(crate::db::DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict { collection, key } => write!(
                f,
                "concurrent write conflict on {}/{key}",
                collection.as_str()
            ),
            Self::KeyExists { collection, key } => {
                write!(f, "document already exists: {}/{key}", collection.as_str())
            }
            Self::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<crate::db::DbError> for StoreError {
    fn from(value: crate::db::DbError) -> Self {
        Self::Db(value)
    }
}

/// One stored document with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: Collection,
    pub key: String,
    pub body: Value,
    pub version: u64,
}

/// One write in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Insert {
        collection: Collection,
        key: String,
        body: Value,
    },
    Update {
        collection: Collection,
        key: String,
        expected_version: u64,
        body: Value,
    },
    Delete {
        collection: Collection,
        key: String,
        expected_version: u64,
    },
}

/// Ordered set of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, collection: Collection, key: impl Into<String>, body: Value) -> Self {
        self.ops.push(WriteOp::Insert {
            collection,
            key: key.into(),
            body,
        });
        self
    }

    pub fn update(
        mut self,
        collection: Collection,
        key: impl Into<String>,
        expected_version: u64,
        body: Value,
    ) -> Self {
        self.ops.push(WriteOp::Update {
            collection,
            key: key.into(),
            expected_version,
            body,
        });
        self
    }

    pub fn delete(
        mut self,
        collection: Collection,
        key: impl Into<String>,
        expected_version: u64,
    ) -> Self {
        self.ops.push(WriteOp::Delete {
            collection,
            key: key.into(),
            expected_version,
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Equality filter on a top-level document field.
pub type FieldFilter<'a> = (&'a str, Value);

/// Get/query/commit primitives with per-document atomicity and
/// optimistic-concurrency batches.
pub trait DocumentStore {
    fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Document>>;

    /// Equality-filtered scan of one collection, newest first.
    fn query(&self, collection: Collection, filters: &[FieldFilter<'_>])
        -> StoreResult<Vec<Document>>;

    /// Applies the batch atomically.
    ///
    /// # Errors
    /// - `Conflict` when any version precondition fails.
    /// - `KeyExists` when an insert hits an existing key.
    fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Single-document insert convenience.
    fn put_new(&self, collection: Collection, key: &str, body: Value) -> StoreResult<()> {
        self.commit(WriteBatch::new().insert(collection, key, body))
    }
}
