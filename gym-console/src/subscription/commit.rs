//! Register / edit / renew commit
//!
//! The member upsert and the subscription payment are written as one batch:
//! either both records land or neither does. A registration also claims the
//! phone number in that batch; the claim is what enforces uniqueness.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::models::{Member, MemberForm, MemberId, MemberStatus, Transaction, TransactionCreate};

use crate::db::{StoreError, WriteBatch};
use crate::db::repository::{RepoError, TenantDb, member, transaction};
use crate::utils::money::validate_amount;
use crate::utils::time::format_date;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, normalize_optional, validate_age,
    validate_optional_email, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

use super::renewal::validate_duration;

/// Result of a committed register/renew
#[derive(Debug, Clone, PartialEq)]
pub struct RenewalOutcome {
    pub member: Member,
    /// Present when a positive payment was entered
    pub transaction: Option<Transaction>,
}

/// Description of a subscription payment: `Subscription: Ada (Jan 10, 2025 - Feb 10, 2025)`
pub fn subscription_description(
    name: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    tz: Tz,
) -> String {
    format!(
        "Subscription: {} ({} - {})",
        name,
        format_date(Some(start), tz),
        format_date(Some(end), tz)
    )
}

fn validate_form(form: &MemberForm) -> AppResult<()> {
    validate_required_text(&form.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&form.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_email(&form.email, "email")?;
    validate_age(form.age)?;
    validate_optional_text(&form.address, "address", MAX_ADDRESS_LEN)?;
    if let Some(amount) = form.payment_amount {
        validate_amount(amount, "paymentAmount")?;
    }
    validate_duration(form.duration_months)?;
    Ok(())
}

/// Resolve the interval to store; absent dates default to `now`
fn resolve_interval(
    form: &MemberForm,
    now: DateTime<Utc>,
) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = form.start_date.unwrap_or(now);
    let end = form.end_date.unwrap_or(now);
    if end < start {
        return Err(AppError::new(ErrorCode::SubscriptionDatesInvalid)
            .with_detail("startDate", start.to_rfc3339())
            .with_detail("endDate", end.to_rfc3339()));
    }
    Ok((start, end))
}

/// Commit a register (`existing == None`) or an edit/renew of `existing`
///
/// Validation failures perform no writes. A store failure leaves neither the
/// member nor the payment written.
pub async fn commit_renewal(
    db: &TenantDb,
    existing: Option<&Member>,
    form: MemberForm,
    now: DateTime<Utc>,
    tz: Tz,
) -> AppResult<RenewalOutcome> {
    validate_form(&form)?;
    let (start, end) = resolve_interval(&form, now)?;

    let name = form.name.trim().to_string();
    let phone = form.phone.trim().to_string();

    let (id, join_date) = match existing {
        Some(current) => {
            if current.phone != phone {
                return Err(AppError::new(ErrorCode::MemberPhoneImmutable)
                    .with_detail("memberId", current.id.as_str()));
            }
            (current.id.clone(), current.join_date)
        }
        None => {
            member::ensure_phone_available(db, &phone, None)
                .await
                .map_err(|e| match e {
                    RepoError::Duplicate(msg) => {
                        AppError::with_message(ErrorCode::MemberPhoneExists, msg)
                            .with_detail("phone", phone.as_str())
                    }
                    other => other.into(),
                })?;
            (MemberId::generate(), now)
        }
    };

    let record = Member {
        id,
        name,
        phone,
        email: normalize_optional(form.email.clone()),
        age: form.age,
        address: normalize_optional(form.address.clone()),
        join_date,
        subscription_start_date: Some(start),
        subscription_end_date: Some(end),
        status: MemberStatus::Active,
    };

    let mut batch = member::stage_upsert(db, WriteBatch::new(), &record)?;
    batch = if existing.is_some() {
        member::stage_keep_phone(db, batch, &record)?
    } else {
        member::stage_claim_phone(db, batch, &record)?
    };
    let mut payment = None;
    if let Some(amount) = form.payment() {
        let create = TransactionCreate::subscription(
            subscription_description(&record.name, start, end, tz),
            amount,
            record.id.clone(),
            record.phone.clone(),
        );
        let (staged, tx) = transaction::stage_create(db, batch, create, now)?;
        batch = staged;
        payment = Some(tx);
    }

    match db.store().commit(batch).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            tracing::warn!(phone = %record.phone, "Phone claimed by a concurrent registration");
            return Err(AppError::with_message(
                ErrorCode::MemberPhoneExists,
                format!("Phone {} is already registered", record.phone),
            )
            .with_detail("phone", record.phone.as_str()));
        }
        Err(e) => {
            tracing::error!(member_id = %record.id, error = %e, "Failed to commit renewal");
            return Err(e.into());
        }
    }

    tracing::info!(
        member_id = %record.id,
        registered = existing.is_none(),
        end = %end,
        paid = ?payment.as_ref().map(|t| t.amount),
        "Subscription committed"
    );

    Ok(RenewalOutcome {
        member: record,
        transaction: payment,
    })
}
