//! 月度报表 - monthly revenue and visit counts for one calendar year

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Transaction, TransactionType};

use crate::utils::time::{calendar_month, calendar_year, month_label};

/// First year offered in the report year picker
pub const FIRST_REPORT_YEAR: i32 = 2024;
/// Last fixed year offered in the report year picker
pub const LAST_REPORT_YEAR: i32 = 2027;

/// One calendar month of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    pub label: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    pub guest_count: usize,
    pub subscription_count: usize,
}

impl MonthBucket {
    fn empty(month0: usize) -> Self {
        Self {
            label: month_label(month0),
            revenue: Decimal::ZERO,
            guest_count: 0,
            subscription_count: 0,
        }
    }
}

/// Twelve buckets, index 0 = January
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub months: [MonthBucket; 12],
}

impl MonthlyReport {
    /// Annual total
    pub fn total_revenue(&self) -> Decimal {
        self.months.iter().map(|m| m.revenue).sum()
    }

    /// Month with the highest revenue; the earliest wins ties
    pub fn top_month(&self) -> &MonthBucket {
        top_month(self)
    }
}

/// Bucket transactions dated in `year` by their own `date`
pub fn monthly_report(transactions: &[Transaction], year: i32, tz: Tz) -> MonthlyReport {
    let mut months: [MonthBucket; 12] = std::array::from_fn(MonthBucket::empty);

    for tx in transactions {
        let (tx_year, month0) = calendar_month(tx.date, tz);
        if tx_year != year {
            continue;
        }
        let bucket = &mut months[month0];
        bucket.revenue += tx.amount;
        match tx.kind {
            TransactionType::Guest => bucket.guest_count += 1,
            TransactionType::Subscription => bucket.subscription_count += 1,
        }
    }

    MonthlyReport { year, months }
}

/// Bucket with the maximum revenue, first occurrence on ties
pub fn top_month(report: &MonthlyReport) -> &MonthBucket {
    let mut best = &report.months[0];
    for bucket in &report.months[1..] {
        if bucket.revenue > best.revenue {
            best = bucket;
        }
    }
    best
}

/// Years offered for selection: the fixed range plus the current year
pub fn report_years(now: DateTime<Utc>, tz: Tz) -> Vec<i32> {
    let mut years: Vec<i32> = (FIRST_REPORT_YEAR..=LAST_REPORT_YEAR).collect();
    let current = calendar_year(now, tz);
    if !years.contains(&current) {
        years.push(current);
        years.sort_unstable();
    }
    years
}
