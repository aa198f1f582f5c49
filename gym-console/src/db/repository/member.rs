//! Member Repository
//!
//! Phone numbers are claimed in `member_phones/{phone}` with a create-only
//! write staged in the same batch as the member, so two registrations of
//! one phone cannot both commit.

use serde::{Deserialize, Serialize};
use shared::models::{Member, MemberId};

use super::{RepoError, RepoResult, TenantDb, decode_all};
use crate::db::{Collection, DocPath, SetMode, WriteBatch};

pub fn path(db: &TenantDb, id: &MemberId) -> DocPath {
    db.path(Collection::Members, id.as_str())
}

/// Phone index entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneClaim {
    member_id: MemberId,
}

pub fn phone_path(db: &TenantDb, phone: &str) -> DocPath {
    db.path(Collection::MemberPhones, phone.trim())
}

pub async fn find_all(db: &TenantDb) -> RepoResult<Vec<Member>> {
    let docs = db.store().query(&db.query(Collection::Members)).await?;
    Ok(decode_all(&docs))
}

pub async fn find_by_id(db: &TenantDb, id: &MemberId) -> RepoResult<Option<Member>> {
    match db.store().get(&path(db, id)).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Member holding this phone number, if any
pub async fn find_by_phone(db: &TenantDb, phone: &str) -> RepoResult<Option<Member>> {
    let phone = phone.trim();
    Ok(find_all(db).await?.into_iter().find(|m| m.phone == phone))
}

/// Reject a phone number already held by another member
pub async fn ensure_phone_available(
    db: &TenantDb,
    phone: &str,
    owner: Option<&MemberId>,
) -> RepoResult<()> {
    if let Some(existing) = find_by_phone(db, phone).await?
        && Some(&existing.id) != owner
    {
        return Err(RepoError::Duplicate(format!(
            "Phone {} is already registered to member {}",
            phone.trim(),
            existing.id
        )));
    }
    Ok(())
}

/// Queue a full replace of the member document
pub fn stage_upsert(db: &TenantDb, batch: WriteBatch, member: &Member) -> RepoResult<WriteBatch> {
    Ok(batch.set(path(db, &member.id), member, SetMode::Replace)?)
}

/// Queue the create-only phone claim of a new member
///
/// The commit fails with `StoreError::Conflict` when the phone is taken.
pub fn stage_claim_phone(db: &TenantDb, batch: WriteBatch, member: &Member) -> RepoResult<WriteBatch> {
    let claim = PhoneClaim {
        member_id: member.id.clone(),
    };
    Ok(batch.create(phone_path(db, &member.phone), &claim)?)
}

/// Queue a phone claim refresh for an existing member (phone is immutable)
pub fn stage_keep_phone(db: &TenantDb, batch: WriteBatch, member: &Member) -> RepoResult<WriteBatch> {
    let claim = PhoneClaim {
        member_id: member.id.clone(),
    };
    Ok(batch.set(phone_path(db, &member.phone), &claim, SetMode::Replace)?)
}

pub async fn upsert(db: &TenantDb, member: &Member) -> RepoResult<()> {
    let batch = stage_upsert(db, WriteBatch::new(), member)?;
    let batch = stage_keep_phone(db, batch, member)?;
    db.store().commit(batch).await?;
    Ok(())
}

/// Hard delete, releasing the phone; returns false when the member did not exist
pub async fn delete(db: &TenantDb, id: &MemberId) -> RepoResult<bool> {
    let path = path(db, id);
    let Some(doc) = db.store().get(&path).await? else {
        return Ok(false);
    };
    let mut batch = WriteBatch::new().delete(path);
    match doc.decode::<Member>() {
        Ok(member) => batch = batch.delete(phone_path(db, &member.phone)),
        Err(e) => tracing::warn!(member_id = %id, error = %e, "Deleting malformed member"),
    }
    db.store().commit(batch).await?;
    Ok(true)
}
