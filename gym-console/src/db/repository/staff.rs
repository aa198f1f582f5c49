//! Staff Directory Repository

use chrono::{DateTime, Utc};
use shared::models::{StaffRecord, StaffRole};

use super::{RepoResult, TenantDb, decode_all};
use crate::db::{Collection, CollectionQuery, DocPath, SetMode, SortKey, WriteBatch};

pub fn path(db: &TenantDb, id: &str) -> DocPath {
    db.path(Collection::Staff, id)
}

/// Directory query, oldest entry first
pub fn by_added_at(db: &TenantDb) -> CollectionQuery {
    db.query(Collection::Staff).order_by(SortKey::asc("addedAt"))
}

pub async fn find_all(db: &TenantDb) -> RepoResult<Vec<StaffRecord>> {
    let docs = db.store().query(&by_added_at(db)).await?;
    Ok(decode_all(&docs))
}

pub fn stage_create(
    db: &TenantDb,
    batch: WriteBatch,
    email: &str,
    role: StaffRole,
    added_at: DateTime<Utc>,
) -> RepoResult<(WriteBatch, StaffRecord)> {
    let record = StaffRecord {
        id: db.store().generate_id(),
        email: email.trim().to_string(),
        role,
        added_at,
    };
    let batch = batch.set(path(db, &record.id), &record, SetMode::Replace)?;
    Ok((batch, record))
}

pub async fn create(
    db: &TenantDb,
    email: &str,
    role: StaffRole,
    added_at: DateTime<Utc>,
) -> RepoResult<StaffRecord> {
    let (batch, record) = stage_create(db, WriteBatch::new(), email, role, added_at)?;
    db.store().commit(batch).await?;
    Ok(record)
}

/// Remove the directory entry only; returns false when it did not exist
pub async fn delete(db: &TenantDb, id: &str) -> RepoResult<bool> {
    let path = path(db, id);
    if db.store().get(&path).await?.is_none() {
        return Ok(false);
    }
    db.store().delete(&path).await?;
    Ok(true)
}
