//! Live-state cache fed by store watches
//!
//! One task per watched collection/document. Each task applies the full
//! snapshot it receives and bumps the revision counter. A failed watch is
//! logged and its slice of the cache keeps the last delivered data.

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use shared::models::{Currency, Member, StaffRecord, SystemConfig, Transaction};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::repository::{TenantDb, decode_all, settings, staff, transaction};
use crate::db::{Collection, Snapshot, SnapshotStream, WatchTarget};

/// Which slice of the cache a watch feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Members,
    Transactions,
    Config,
    Staff,
}

impl Feed {
    fn name(&self) -> &'static str {
        match self {
            Feed::Members => "members",
            Feed::Transactions => "transactions",
            Feed::Config => "config",
            Feed::Staff => "staff",
        }
    }

    fn target(&self, db: &TenantDb) -> WatchTarget {
        match self {
            Feed::Members => WatchTarget::Collection(db.query(Collection::Members)),
            Feed::Transactions => WatchTarget::Collection(transaction::newest_first(db)),
            Feed::Config => WatchTarget::Document(settings::config_path(db)),
            Feed::Staff => WatchTarget::Collection(staff::by_added_at(db)),
        }
    }
}

/// Last delivered data per feed
#[derive(Debug, Clone, Default)]
pub struct LiveData {
    pub members: Vec<Member>,
    /// Newest first
    pub transactions: Vec<Transaction>,
    pub config: Option<SystemConfig>,
    pub staff: Vec<StaffRecord>,
}

impl LiveData {
    fn apply(&mut self, feed: Feed, snapshot: Snapshot) {
        match (feed, snapshot) {
            (Feed::Members, Snapshot::Collection(docs)) => self.members = decode_all(&docs),
            (Feed::Transactions, Snapshot::Collection(docs)) => {
                self.transactions = decode_all(&docs)
            }
            (Feed::Staff, Snapshot::Collection(docs)) => self.staff = decode_all(&docs),
            (Feed::Config, Snapshot::Document(doc)) => {
                self.config = doc.and_then(|d| match d.decode::<SystemConfig>() {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring malformed config document");
                        None
                    }
                })
            }
            (feed, _) => {
                tracing::warn!(feed = feed.name(), "Snapshot shape does not match feed");
            }
        }
    }
}

struct Running {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Session-scoped cache of members, transactions, config and staff
pub struct LiveState {
    data: Arc<RwLock<LiveData>>,
    revision: Arc<watch::Sender<u64>>,
    running: Mutex<Option<Running>>,
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveState {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            data: Arc::new(RwLock::new(LiveData::default())),
            revision: Arc::new(revision),
            running: Mutex::new(None),
        }
    }

    /// Start all watches; a running set is replaced
    pub async fn start(&self, db: &TenantDb) {
        self.stop().await;

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();
        for feed in [Feed::Members, Feed::Transactions, Feed::Config, Feed::Staff] {
            match db.store().watch(feed.target(db)).await {
                Ok(stream) => tasks.push(tokio::spawn(run_feed(
                    feed,
                    stream,
                    self.data.clone(),
                    self.revision.clone(),
                    cancel.clone(),
                ))),
                Err(e) => {
                    tracing::error!(feed = feed.name(), error = %e, "Failed to subscribe");
                }
            }
        }
        tracing::debug!(feeds = tasks.len(), "Live state started");
        *self.running.lock() = Some(Running { cancel, tasks });
    }

    /// Tear down every watch and drop cached data
    pub async fn stop(&self) {
        let running = self.running.lock().take();
        let Some(running) = running else {
            return;
        };
        running.cancel.cancel();
        for task in running.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Live state task ended abnormally");
            }
        }
        *self.data.write() = LiveData::default();
        self.revision.send_modify(|r| *r += 1);
        tracing::debug!("Live state stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Copy of the cached data
    pub fn snapshot(&self) -> LiveData {
        self.data.read().clone()
    }

    pub fn members(&self) -> Vec<Member> {
        self.data.read().members.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.data.read().transactions.clone()
    }

    pub fn staff(&self) -> Vec<StaffRecord> {
        self.data.read().staff.clone()
    }

    /// Display currency; `fallback` until a config document exists
    pub fn currency(&self, fallback: Currency) -> Currency {
        self.data
            .read()
            .config
            .as_ref()
            .map_or(fallback, |c| c.currency)
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Notified after every applied snapshot
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Wait until the revision reaches at least `target`
    pub async fn wait_for_revision(&self, target: u64) {
        let mut rx = self.subscribe();
        // sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|r| *r >= target).await;
    }
}

async fn run_feed(
    feed: Feed,
    mut stream: SnapshotStream,
    data: Arc<RwLock<LiveData>>,
    revision: Arc<watch::Sender<u64>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::trace!(feed = feed.name(), "Feed cancelled");
                return;
            }
            item = stream.next() => match item {
                Some(Ok(snapshot)) => {
                    data.write().apply(feed, snapshot);
                    revision.send_modify(|r| *r += 1);
                }
                Some(Err(e)) => {
                    // stale-but-available: keep what we have
                    tracing::error!(feed = feed.name(), error = %e, "Subscription failed");
                    return;
                }
                None => {
                    tracing::debug!(feed = feed.name(), "Feed closed");
                    return;
                }
            }
        }
    }
}
