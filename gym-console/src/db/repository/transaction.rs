//! Transaction Repository
//!
//! Append and delete only; ledger entries are never updated in place.

use chrono::{DateTime, Utc};
use shared::models::{Transaction, TransactionCreate};

use super::{RepoResult, TenantDb, decode_all};
use crate::db::{Collection, CollectionQuery, DocPath, SetMode, SortKey, WriteBatch};

/// Sort field for the ledger
pub const DATE_FIELD: &str = "date";

pub fn path(db: &TenantDb, id: &str) -> DocPath {
    db.path(Collection::Transactions, id)
}

/// Ledger query, newest first
pub fn newest_first(db: &TenantDb) -> CollectionQuery {
    db.query(Collection::Transactions)
        .order_by(SortKey::desc(DATE_FIELD))
}

pub async fn find_all(db: &TenantDb) -> RepoResult<Vec<Transaction>> {
    let docs = db.store().query(&newest_first(db)).await?;
    Ok(decode_all(&docs))
}

pub async fn find_by_id(db: &TenantDb, id: &str) -> RepoResult<Option<Transaction>> {
    match db.store().get(&path(db, id)).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Assign id and date, then queue the write
pub fn stage_create(
    db: &TenantDb,
    batch: WriteBatch,
    data: TransactionCreate,
    date: DateTime<Utc>,
) -> RepoResult<(WriteBatch, Transaction)> {
    let tx = data.into_transaction(db.store().generate_id(), date);
    let batch = batch.set(path(db, &tx.id), &tx, SetMode::Replace)?;
    Ok((batch, tx))
}

pub async fn create(
    db: &TenantDb,
    data: TransactionCreate,
    date: DateTime<Utc>,
) -> RepoResult<Transaction> {
    let (batch, tx) = stage_create(db, WriteBatch::new(), data, date)?;
    db.store().commit(batch).await?;
    Ok(tx)
}

/// Hard delete; returns false when the entry did not exist
pub async fn delete(db: &TenantDb, id: &str) -> RepoResult<bool> {
    let path = path(db, id);
    if db.store().get(&path).await?.is_none() {
        return Ok(false);
    }
    db.store().delete(&path).await?;
    Ok(true)
}
