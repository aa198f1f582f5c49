//! `settings/system` observer
//!
//! Runs for the life of the console, independent of any session, so the
//! login screen knows whether first-run setup is still possible.

use std::sync::Arc;

use futures::StreamExt;
use shared::models::SystemStatus;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::AccessGate;
use crate::db::repository::{TenantDb, settings};
use crate::db::{Snapshot, WatchTarget};

/// Spawn the observer; it ends on cancellation or when the watch fails
pub async fn spawn_status_watch(
    db: &TenantDb,
    gate: Arc<AccessGate>,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    let mut stream = match db
        .store()
        .watch(WatchTarget::Document(settings::system_path(db)))
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "Failed to observe system status");
            return None;
        }
    };

    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                item = stream.next() => match item {
                    Some(Ok(Snapshot::Document(doc))) => {
                        let status = doc
                            .and_then(|d| d.decode::<SystemStatus>().ok())
                            .unwrap_or_default();
                        gate.observe_initialized(status.initialized);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "System status subscription failed");
                        return;
                    }
                    None => return,
                }
            }
        }
    }))
}
