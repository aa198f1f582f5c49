//! Staff administration
//!
//! A directory entry and a login credential have separate lifecycles:
//! adding staff creates both, removing staff deletes only the entry.

use chrono::{DateTime, Utc};
use shared::models::{StaffCreate, StaffRecord, StaffRole};

use crate::auth::CredentialProvider;
use crate::core::Confirmation;
use crate::db::repository::{TenantDb, staff};
use crate::utils::validation::{MAX_PASSWORD_LEN, validate_email};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Create a staff credential and directory entry
///
/// The caller's current session is left untouched.
pub async fn add_staff(
    db: &TenantDb,
    provider: &dyn CredentialProvider,
    data: StaffCreate,
    now: DateTime<Utc>,
) -> AppResult<StaffRecord> {
    validate_email(&data.email, "email")?;
    if data.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password is too long (max {MAX_PASSWORD_LEN})"
        )));
    }

    let created = provider
        .create_credential(data.email.trim(), &data.password)
        .await
        .map_err(AppError::from)?;

    let record = staff::create(db, &created.email, StaffRole::Staff, now)
        .await
        .map_err(|e| {
            // the credential stays, without a directory entry
            tracing::error!(email = %created.email, error = %e, "Failed to write staff entry");
            AppError::from(e)
        })?;
    tracing::info!(id = %record.id, email = %record.email, "Staff added");
    Ok(record)
}

/// Delete a directory entry; the credential stays valid
pub async fn remove_staff(
    db: &TenantDb,
    id: &str,
    confirmation: Confirmation,
) -> AppResult<bool> {
    if !confirmation.is_accepted() {
        return Ok(false);
    }
    let removed = staff::delete(db, id).await.map_err(|e| {
        tracing::error!(id, error = %e, "Failed to remove staff entry");
        AppError::from(e)
    })?;
    if !removed {
        return Err(AppError::with_message(
            ErrorCode::StaffNotFound,
            format!("Staff {id} not found"),
        ));
    }
    tracing::info!(id, "Staff entry removed");
    Ok(true)
}
