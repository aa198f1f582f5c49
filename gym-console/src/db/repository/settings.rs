//! Settings Repository (Singletons)
//!
//! `settings/config` and `settings/system` are single documents.

use shared::models::{Currency, SystemConfig, SystemStatus};

use super::{RepoResult, TenantDb};
use crate::db::{Collection, DocPath, SetMode, WriteBatch};

const CONFIG_ID: &str = "config";
const SYSTEM_ID: &str = "system";

pub fn config_path(db: &TenantDb) -> DocPath {
    db.path(Collection::Settings, CONFIG_ID)
}

pub fn system_path(db: &TenantDb) -> DocPath {
    db.path(Collection::Settings, SYSTEM_ID)
}

/// Stored config, `None` until first written
pub async fn get_config(db: &TenantDb) -> RepoResult<Option<SystemConfig>> {
    match db.store().get(&config_path(db)).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Write the currency and bump the version stamp (last write wins)
pub async fn set_currency(db: &TenantDb, currency: Currency) -> RepoResult<SystemConfig> {
    let version = get_config(db).await?.map_or(0, |c| c.version);
    let config = SystemConfig {
        currency,
        version: version + 1,
    };
    let batch = WriteBatch::new().set(config_path(db), &config, SetMode::Merge)?;
    db.store().commit(batch).await?;
    Ok(config)
}

/// First-run flag; a missing document reads as uninitialized
pub async fn get_status(db: &TenantDb) -> RepoResult<SystemStatus> {
    match db.store().get(&system_path(db)).await? {
        Some(doc) => Ok(doc.decode()?),
        None => Ok(SystemStatus::default()),
    }
}

/// Queue the one-way `initialized: true` write
pub fn stage_mark_initialized(db: &TenantDb, batch: WriteBatch) -> RepoResult<WriteBatch> {
    let status = SystemStatus { initialized: true };
    Ok(batch.set(system_path(db), &status, SetMode::Merge)?)
}
