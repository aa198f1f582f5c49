//! Dashboard statistics

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Member, Transaction, TransactionType};

use crate::utils::time::{calendar_month, local_date};

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sum of amounts dated in `now`'s calendar month
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    /// Guest entries dated on `now`'s calendar day
    pub guests_today: usize,
    /// Members whose interval ends strictly after `now`
    pub active_members: usize,
}

/// Recomputed from scratch on every call
pub fn dashboard_stats(
    members: &[Member],
    transactions: &[Transaction],
    now: DateTime<Utc>,
    tz: Tz,
) -> DashboardStats {
    let this_month = calendar_month(now, tz);
    let today = local_date(now, tz);

    let mut revenue = Decimal::ZERO;
    let mut guests_today = 0;
    for tx in transactions {
        if calendar_month(tx.date, tz) == this_month {
            revenue += tx.amount;
        }
        if tx.kind == TransactionType::Guest && local_date(tx.date, tz) == today {
            guests_today += 1;
        }
    }

    let active_members = members.iter().filter(|m| m.is_current(now)).count();

    DashboardStats {
        revenue,
        guests_today,
        active_members,
    }
}
