//! Renewal date computation
//!
//! Renewals stack onto remaining time: a member whose interval has not ended
//! yet starts the new interval at the old end date.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::MemberForm;

use crate::utils::time::add_months;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Longest duration accepted for one payment (10 years)
pub const MAX_DURATION_MONTHS: u32 = 120;

/// `[start, end)` billing interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn validate_duration(duration_months: u32) -> AppResult<u32> {
    if duration_months == 0 || duration_months > MAX_DURATION_MONTHS {
        return Err(AppError::with_message(
            ErrorCode::SubscriptionDurationInvalid,
            format!("Duration must be between 1 and {MAX_DURATION_MONTHS} months, got {duration_months}"),
        )
        .with_detail("field", "durationMonths"));
    }
    Ok(duration_months)
}

/// New billing interval for a payment covering `duration_months`
///
/// Starts at `current_end` when it is strictly after `now`, otherwise at
/// `now`. The end is `duration_months` calendar months later in the business
/// timezone.
pub fn compute_renewal(
    current_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration_months: u32,
    tz: Tz,
) -> AppResult<BillingInterval> {
    let duration = validate_duration(duration_months)?;
    let start = match current_end {
        Some(end) if end > now => end,
        _ => now,
    };
    let end = add_months(start, duration, tz).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::SubscriptionDurationInvalid,
            "Subscription end date is out of range",
        )
    })?;
    Ok(BillingInterval { start, end })
}

/// Dates shown in an in-progress register/renew form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalDraft {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl RenewalDraft {
    /// Re-derive the draft dates after the amount or duration changed
    ///
    /// With a positive amount the interval is computed from the member's
    /// committed end date, never from the dates already in the form, so
    /// editing the duration twice does not compound. Without a payment the
    /// dates the operator entered are kept.
    pub fn recompute(
        committed_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        amount: Option<Decimal>,
        duration_months: u32,
        entered: RenewalDraft,
        tz: Tz,
    ) -> AppResult<Self> {
        match amount {
            Some(amount) if amount > Decimal::ZERO => {
                let interval = compute_renewal(committed_end, now, duration_months, tz)?;
                Ok(Self {
                    start_date: Some(interval.start),
                    end_date: Some(interval.end),
                })
            }
            _ => Ok(entered),
        }
    }

    /// Recompute from a form and write the result back into it
    pub fn refresh_form(
        form: &mut MemberForm,
        committed_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> AppResult<Self> {
        let entered = Self {
            start_date: form.start_date,
            end_date: form.end_date,
        };
        let draft = Self::recompute(
            committed_end,
            now,
            form.payment_amount,
            form.duration_months,
            entered,
            tz,
        )?;
        form.start_date = draft.start_date;
        form.end_date = draft.end_date;
        Ok(draft)
    }
}
