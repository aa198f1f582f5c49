//! In-process document store
//!
//! 所有数据保存在内存中; live watches are driven by a broadcast channel of
//! change keys, and every delivery recomputes the full result set.
//!
//! Faults can be injected for tests: failing reads or writes, failing new
//! watches, and breaking the watches that are already running.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::{
    Collection, CollectionQuery, DocPath, Document, DocumentStore, SetMode, Snapshot,
    SnapshotStream, StoreError, StoreResult, WatchTarget, WriteBatch, WriteOp,
};

/// Capacity of the change notification channel
const CHANGE_CHANNEL_CAPACITY: usize = 256;

type CollectionKey = (String, Collection);

#[derive(Debug, Clone)]
enum ChangeEvent {
    Changed(CollectionKey),
    Broken(CollectionKey, String),
}

impl ChangeEvent {
    fn key(&self) -> &CollectionKey {
        match self {
            ChangeEvent::Changed(key) | ChangeEvent::Broken(key, _) => key,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    read: Option<String>,
    write: Option<String>,
    watch: Option<String>,
}

struct Inner {
    data: RwLock<HashMap<CollectionKey, BTreeMap<String, Value>>>,
    changes: broadcast::Sender<ChangeEvent>,
    faults: Mutex<Faults>,
}

impl Inner {
    fn check_read(&self) -> StoreResult<()> {
        match self.faults.lock().read.clone() {
            Some(msg) => Err(StoreError::Read(msg)),
            None => Ok(()),
        }
    }

    fn read_collection(&self, query: &CollectionQuery) -> Vec<Document> {
        let key = (query.tenant.clone(), query.collection);
        let mut docs: Vec<Document> = self
            .data
            .read()
            .get(&key)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(sort) = &query.order_by {
            docs.sort_by(|a, b| sort.compare(a, b));
        }
        docs
    }

    fn read_document(&self, path: &DocPath) -> Option<Document> {
        let key = (path.tenant.clone(), path.collection);
        self.data
            .read()
            .get(&key)
            .and_then(|docs| docs.get(&path.id))
            .map(|data| Document {
                id: path.id.clone(),
                data: data.clone(),
            })
    }

    fn snapshot(&self, target: &WatchTarget) -> Snapshot {
        match target {
            WatchTarget::Collection(query) => Snapshot::Collection(self.read_collection(query)),
            WatchTarget::Document(path) => Snapshot::Document(self.read_document(path)),
        }
    }
}

/// In-memory [`DocumentStore`]
///
/// Cloning shares the underlying data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(HashMap::new()),
                changes,
                faults: Mutex::new(Faults::default()),
            }),
        }
    }

    /// Make every following commit fail with `message` (None clears)
    pub fn fail_writes(&self, message: Option<&str>) {
        self.inner.faults.lock().write = message.map(str::to_string);
    }

    /// Make every following `get`/`query` fail with `message` (None clears)
    pub fn fail_reads(&self, message: Option<&str>) {
        self.inner.faults.lock().read = message.map(str::to_string);
    }

    /// Make every following `watch` call fail with `message` (None clears)
    pub fn fail_watches(&self, message: Option<&str>) {
        self.inner.faults.lock().watch = message.map(str::to_string);
    }

    /// Terminate running watches on a collection with an error
    pub fn break_watches(&self, tenant: &str, collection: Collection, message: &str) {
        let event = ChangeEvent::Broken((tenant.to_string(), collection), message.to_string());
        // no receivers is fine
        let _ = self.inner.changes.send(event);
    }

    /// Number of documents in a collection
    pub fn count(&self, tenant: &str, collection: Collection) -> usize {
        self.inner
            .data
            .read()
            .get(&(tenant.to_string(), collection))
            .map_or(0, BTreeMap::len)
    }
}

/// Shallow merge of top-level object fields
fn merge_into(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(fields)) => {
            for (k, v) in fields {
                existing.insert(k, v);
            }
        }
        (target, patch) => *target = patch,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        self.inner.check_read()?;
        Ok(self.inner.read_document(path))
    }

    async fn query(&self, query: &CollectionQuery) -> StoreResult<Vec<Document>> {
        self.inner.check_read()?;
        Ok(self.inner.read_collection(query))
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if let Some(msg) = self.inner.faults.lock().write.clone() {
            return Err(StoreError::Write(msg));
        }
        if batch.is_empty() {
            return Ok(());
        }

        let mut touched: Vec<CollectionKey> = Vec::new();
        {
            // single lock scope: readers see all of the batch or none of it
            let mut data = self.inner.data.write();
            for op in batch.ops() {
                if let WriteOp::Create { path, .. } = op {
                    let key = (path.tenant.clone(), path.collection);
                    if data.get(&key).is_some_and(|docs| docs.contains_key(&path.id)) {
                        return Err(StoreError::Conflict(path.to_string()));
                    }
                }
            }
            for op in batch.into_ops() {
                match op {
                    WriteOp::Set { path, data: value, mode } => {
                        let key = (path.tenant, path.collection);
                        let docs = data.entry(key.clone()).or_default();
                        if mode == SetMode::Merge
                            && let Some(existing) = docs.get_mut(&path.id)
                        {
                            merge_into(existing, value);
                        } else {
                            docs.insert(path.id, value);
                        }
                        if !touched.contains(&key) {
                            touched.push(key);
                        }
                    }
                    WriteOp::Create { path, data: value } => {
                        let key = (path.tenant, path.collection);
                        data.entry(key.clone()).or_default().insert(path.id, value);
                        if !touched.contains(&key) {
                            touched.push(key);
                        }
                    }
                    WriteOp::Delete { path } => {
                        let key = (path.tenant, path.collection);
                        if let Some(docs) = data.get_mut(&key)
                            && docs.remove(&path.id).is_some()
                            && !touched.contains(&key)
                        {
                            touched.push(key);
                        }
                    }
                }
            }
        }

        for key in touched {
            tracing::trace!(tenant = %key.0, collection = %key.1, "Collection changed");
            let _ = self.inner.changes.send(ChangeEvent::Changed(key));
        }
        Ok(())
    }

    async fn watch(&self, target: WatchTarget) -> StoreResult<SnapshotStream> {
        if let Some(msg) = self.inner.faults.lock().watch.clone() {
            return Err(StoreError::Subscription(msg));
        }

        // subscribe before reading so no change slips between the two
        let rx = self.inner.changes.subscribe();
        let initial = self.inner.snapshot(&target);
        let key: CollectionKey = (target.tenant().to_string(), target.collection());

        let state = WatchState {
            pending: Some(Ok(initial)),
            rx,
            inner: self.inner.clone(),
            target,
            key,
            done: false,
        };

        let stream = futures::stream::unfold(state, |mut state| async move {
            if let Some(item) = state.pending.take() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            loop {
                match state.rx.recv().await {
                    Ok(event) if event.key() != &state.key => continue,
                    Ok(ChangeEvent::Changed(_)) | Err(RecvError::Lagged(_)) => {
                        let snapshot = state.inner.snapshot(&state.target);
                        return Some((Ok(snapshot), state));
                    }
                    Ok(ChangeEvent::Broken(_, msg)) => {
                        state.done = true;
                        return Some((Err(StoreError::Subscription(msg)), state));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        Ok(stream.boxed())
    }
}

struct WatchState {
    pending: Option<StoreResult<Snapshot>>,
    rx: broadcast::Receiver<ChangeEvent>,
    inner: Arc<Inner>,
    target: WatchTarget,
    key: CollectionKey,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SortKey;
    use serde_json::json;

    const TENANT: &str = "gym";

    fn path(collection: Collection, id: &str) -> DocPath {
        DocPath::new(TENANT, collection, id)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        let p = path(Collection::Members, "m1");
        store.set(&p, json!({"name": "Ada"}), SetMode::Replace).await.unwrap();

        let doc = store.get(&p).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Ada");

        store.delete(&p).await.unwrap();
        assert!(store.get(&p).await.unwrap().is_none());
        // deleting again is fine
        store.delete(&p).await.unwrap();
    }

    #[tokio::test]
    async fn test_merge_keeps_other_fields() {
        let store = MemoryStore::new();
        let p = path(Collection::Settings, "config");
        store
            .set(&p, json!({"currency": "USD", "version": 1}), SetMode::Replace)
            .await
            .unwrap();
        store
            .set(&p, json!({"currency": "EUR"}), SetMode::Merge)
            .await
            .unwrap();

        let doc = store.get(&p).await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"currency": "EUR", "version": 1}));
    }

    #[tokio::test]
    async fn test_query_sorted_desc() {
        let store = MemoryStore::new();
        for (id, date) in [("a", "2025-01-01T00:00:00Z"), ("b", "2025-03-01T00:00:00Z"), ("c", "2025-02-01T00:00:00Z")] {
            store
                .set(&path(Collection::Transactions, id), json!({"date": date}), SetMode::Replace)
                .await
                .unwrap();
        }
        let query = CollectionQuery::new(TENANT, Collection::Transactions).order_by(SortKey::desc("date"));
        let ids: Vec<String> = store.query(&query).await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let store = MemoryStore::new();
        store.fail_writes(Some("offline"));

        let batch = WriteBatch::new()
            .set(path(Collection::Members, "m1"), &json!({"name": "Ada"}), SetMode::Replace)
            .unwrap()
            .set(path(Collection::Transactions, "t1"), &json!({"amount": 100}), SetMode::Replace)
            .unwrap();
        let err = store.commit(batch).await.unwrap_err();
        assert_eq!(err, StoreError::Write("offline".into()));
        assert_eq!(store.count(TENANT, Collection::Members), 0);
        assert_eq!(store.count(TENANT, Collection::Transactions), 0);
    }

    #[tokio::test]
    async fn test_create_conflict_rejects_whole_batch() {
        let store = MemoryStore::new();
        let index = path(Collection::MemberPhones, "555-0123");
        store
            .commit(WriteBatch::new().create(index.clone(), &json!({"memberId": "m1"})).unwrap())
            .await
            .unwrap();

        let batch = WriteBatch::new()
            .set(path(Collection::Members, "m2"), &json!({"name": "Bob"}), SetMode::Replace)
            .unwrap()
            .create(index.clone(), &json!({"memberId": "m2"}))
            .unwrap();
        let err = store.commit(batch).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict("gym/member_phones/555-0123".into()));
        assert_eq!(store.count(TENANT, Collection::Members), 0);
        let doc = store.get(&index).await.unwrap().unwrap();
        assert_eq!(doc.data["memberId"], "m1");
    }

    #[tokio::test]
    async fn test_watch_delivers_initial_then_changes() {
        let store = MemoryStore::new();
        let query = CollectionQuery::new(TENANT, Collection::Members);
        let mut watch = store.watch(WatchTarget::Collection(query)).await.unwrap();

        let first = watch.next().await.unwrap().unwrap();
        assert_eq!(first, Snapshot::Collection(vec![]));

        store
            .set(&path(Collection::Members, "m1"), json!({"name": "Ada"}), SetMode::Replace)
            .await
            .unwrap();
        match watch.next().await.unwrap().unwrap() {
            Snapshot::Collection(docs) => assert_eq!(docs.len(), 1),
            other => panic!("unexpected snapshot: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_watch_ignores_other_collections() {
        let store = MemoryStore::new();
        let mut watch = store
            .watch(WatchTarget::Document(path(Collection::Settings, "config")))
            .await
            .unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap(), Snapshot::Document(None));

        store
            .set(&path(Collection::Members, "m1"), json!({}), SetMode::Replace)
            .await
            .unwrap();
        store
            .set(&path(Collection::Settings, "config"), json!({"currency": "GBP"}), SetMode::Replace)
            .await
            .unwrap();

        match watch.next().await.unwrap().unwrap() {
            Snapshot::Document(Some(doc)) => assert_eq!(doc.data["currency"], "GBP"),
            other => panic!("unexpected snapshot: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_broken_watch_ends_with_error() {
        let store = MemoryStore::new();
        let mut watch = store
            .watch(WatchTarget::Collection(CollectionQuery::new(TENANT, Collection::Staff)))
            .await
            .unwrap();
        watch.next().await.unwrap().unwrap();

        store.break_watches(TENANT, Collection::Staff, "permission denied");
        let err = watch.next().await.unwrap().unwrap_err();
        assert_eq!(err, StoreError::Subscription("permission denied".into()));
        assert!(watch.next().await.is_none());
    }

    #[tokio::test]
    async fn test_watch_fault() {
        let store = MemoryStore::new();
        store.fail_watches(Some("quota"));
        let result = store
            .watch(WatchTarget::Collection(CollectionQuery::new(TENANT, Collection::Members)))
            .await;
        assert!(matches!(result, Err(StoreError::Subscription(_))));
    }
}
