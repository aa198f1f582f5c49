//! Transaction ledger
//!
//! Append-only record of subscription payments and guest fees. Entries are
//! never amended; a correction is a delete followed by a new append.

use chrono::{DateTime, Utc};
use shared::models::{GuestCheckIn, Transaction, TransactionCreate, TransactionType};

use crate::core::Confirmation;
use crate::db::repository::{TenantDb, transaction};
use crate::utils::money::validate_amount;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, normalize_optional, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Append an entry; the ledger assigns id and `date`
pub async fn append(
    db: &TenantDb,
    data: TransactionCreate,
    now: DateTime<Utc>,
) -> AppResult<Transaction> {
    validate_required_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.note, "note", MAX_NOTE_LEN)?;
    validate_amount(data.amount, "amount")?;

    let tx = transaction::create(db, data, now).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to append transaction");
        AppError::from(e)
    })?;
    tracing::info!(id = %tx.id, kind = tx.kind.as_str(), amount = %tx.amount, "Transaction appended");
    Ok(tx)
}

/// Record a guest walk-in fee as `Guest: {name}`
pub async fn check_in_guest(
    db: &TenantDb,
    check_in: GuestCheckIn,
    now: DateTime<Utc>,
) -> AppResult<Transaction> {
    validate_required_text(&check_in.name, "name", MAX_NAME_LEN)?;
    let amount = match check_in.amount {
        Some(amount) if amount > rust_decimal::Decimal::ZERO => amount,
        Some(amount) => {
            return Err(AppError::invalid_amount(format!(
                "Guest fee must be greater than zero, got {amount}"
            ))
            .with_detail("field", "amount"));
        }
        None => {
            return Err(AppError::with_message(ErrorCode::RequiredField, "Guest fee is required")
                .with_detail("field", "amount"));
        }
    };

    let description = format!("Guest: {}", check_in.name.trim());
    append(
        db,
        TransactionCreate::guest(description, amount, normalize_optional(check_in.note)),
        now,
    )
    .await
}

/// Irrevocably delete an entry
///
/// `Declined` is a no-op returning `Ok(false)`.
pub async fn remove(db: &TenantDb, id: &str, confirmation: Confirmation) -> AppResult<bool> {
    if !confirmation.is_accepted() {
        return Ok(false);
    }
    let removed = transaction::delete(db, id).await.map_err(|e| {
        tracing::error!(id, error = %e, "Failed to delete transaction");
        AppError::from(e)
    })?;
    if !removed {
        return Err(AppError::with_message(
            ErrorCode::TransactionNotFound,
            format!("Transaction {id} not found"),
        ));
    }
    tracing::info!(id, "Transaction deleted");
    Ok(true)
}

/// Lazy filter by kind
pub fn list_by_type(
    transactions: &[Transaction],
    kind: TransactionType,
) -> impl Iterator<Item = &Transaction> {
    transactions.iter().filter(move |t| t.kind == kind)
}

/// Newest `n` entries, newest first
pub fn recent(transactions: &[Transaction], n: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(n);
    sorted
}
