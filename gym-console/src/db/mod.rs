//! Document store layer
//!
//! The console is a client of a managed real-time document store. This
//! module defines the contract it relies on ([`DocumentStore`]) and ships an
//! in-process implementation ([`MemoryStore`]).
//!
//! # Layout
//!
//! ```text
//! {tenant}/members/{memberId}
//! {tenant}/member_phones/{phone}      # phone -> memberId, create-only
//! {tenant}/transactions/{generatedId}
//! {tenant}/staff/{generatedId}
//! {tenant}/settings/config
//! {tenant}/settings/system
//! ```
//!
//! Live watches deliver the full current result set on every change. Order
//! is guaranteed per watch only; two watches on different collections may
//! observe one logical change in either order.

pub mod memory;
pub mod repository;

pub use memory::MemoryStore;

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::utils::AppError;

/// Top-level collections under the tenant namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Members,
    /// Phone uniqueness index
    MemberPhones,
    Transactions,
    Staff,
    Settings,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Members => "members",
            Collection::MemberPhones => "member_phones",
            Collection::Transactions => "transactions",
            Collection::Staff => "staff",
            Collection::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(tenant, collection, id)` document address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub tenant: String,
    pub collection: Collection,
    pub id: String,
}

impl DocPath {
    pub fn new(tenant: impl Into<String>, collection: Collection, id: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            collection,
            id: id.into(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.collection, self.id)
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decode the document body into a model
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| StoreError::Decode(format!("document {}: {}", self.id, e)))
    }
}

/// How `set` treats an existing document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Replace the whole document
    Replace,
    /// Overwrite only the supplied top-level fields
    Merge,
}

/// Sort specification for collection reads and watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Compare two documents by this key; missing fields sort last, ties by id
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = match (a.data.get(&self.field), b.data.get(&self.field)) {
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                if self.descending { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ord.then_with(|| a.id.cmp(&b.id))
    }
}

/// Order JSON scalars: numbers numerically, RFC 3339 strings chronologically
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Collection read / watch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub tenant: String,
    pub collection: Collection,
    pub order_by: Option<SortKey>,
}

impl CollectionQuery {
    pub fn new(tenant: impl Into<String>, collection: Collection) -> Self {
        Self {
            tenant: tenant.into(),
            collection,
            order_by: None,
        }
    }

    pub fn order_by(mut self, key: SortKey) -> Self {
        self.order_by = Some(key);
        self
    }
}

/// What a live watch observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    Collection(CollectionQuery),
    Document(DocPath),
}

impl WatchTarget {
    pub fn tenant(&self) -> &str {
        match self {
            WatchTarget::Collection(q) => &q.tenant,
            WatchTarget::Document(p) => &p.tenant,
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            WatchTarget::Collection(q) => q.collection,
            WatchTarget::Document(p) => p.collection,
        }
    }
}

/// Full current value of a watch target
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Collection(Vec<Document>),
    Document(Option<Document>),
}

/// Stream of snapshots; the first item is the current state
pub type SnapshotStream = BoxStream<'static, StoreResult<Snapshot>>;

/// One write inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: DocPath,
        data: Value,
        mode: SetMode,
    },
    /// Fails the whole batch with [`StoreError::Conflict`] if the document exists
    Create {
        path: DocPath,
        data: Value,
    },
    Delete {
        path: DocPath,
    },
}

/// Writes applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a set of a serializable value
    pub fn set<T: Serialize>(mut self, path: DocPath, value: &T, mode: SetMode) -> StoreResult<Self> {
        let data = serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.ops.push(WriteOp::Set { path, data, mode });
        Ok(self)
    }

    /// Queue a create-only write
    pub fn create<T: Serialize>(mut self, path: DocPath, value: &T) -> StoreResult<Self> {
        let data = serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.ops.push(WriteOp::Create { path, data });
        Ok(self)
    }

    pub fn delete(mut self, path: DocPath) -> Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Store error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Write failed: {0}")]
    Write(String),

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Document already exists: {0}")]
    Conflict(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Write(msg) | StoreError::Encode(msg) => AppError::store_write(msg),
            StoreError::Read(msg) | StoreError::Decode(msg) => AppError::store_read(msg),
            StoreError::Subscription(msg) => AppError::store_subscription(msg),
            StoreError::Conflict(path) => AppError::already_exists(path),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Real-time document store contract
///
/// Every call is a suspension point; the caller observes either a result or
/// a provider-reported failure. Writes are last-write-wins with no
/// concurrency token.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate an id for a new document
    fn generate_id(&self) -> String;

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>>;

    async fn query(&self, query: &CollectionQuery) -> StoreResult<Vec<Document>>;

    /// Apply every write in the batch or none of them
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Start a live watch; the first item is the current state
    async fn watch(&self, target: WatchTarget) -> StoreResult<SnapshotStream>;

    async fn set(&self, path: &DocPath, data: Value, mode: SetMode) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.ops.push(WriteOp::Set {
            path: path.clone(),
            data,
            mode,
        });
        self.commit(batch).await
    }

    /// Delete a document; deleting a missing document succeeds
    async fn delete(&self, path: &DocPath) -> StoreResult<()> {
        self.commit(WriteBatch::new().delete(path.clone())).await
    }
}
