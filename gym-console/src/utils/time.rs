//! 时间工具函数 (业务时区日历计算)
//!
//! Timestamps are stored as UTC. Calendar questions (which month, which
//! day, month arithmetic) are answered in the configured business timezone.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

const DAY_MILLIS: i64 = 86_400_000;

/// Flat month length used by the display approximation
pub const DISPLAY_MONTH_DAYS: i64 = 30;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Short month label for a zero-based month index
pub fn month_label(month0: usize) -> &'static str {
    MONTH_LABELS.get(month0).copied().unwrap_or("")
}

/// 本地时间 → UTC
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，按 UTC 解释。
fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Add calendar months in the business timezone
///
/// The local day-of-month is kept where the target month has it and is
/// clamped to the target month's last day otherwise (Jan 31 + 1 → Feb 28).
/// Returns `None` when the result is out of range.
pub fn add_months(ts: DateTime<Utc>, months: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let local = ts.with_timezone(&tz).naive_local();
    let shifted = local.checked_add_months(Months::new(months))?;
    Some(local_to_utc(shifted, tz))
}

/// Whole 30-day months remaining until `end`, never negative
///
/// `floor(ceil((end - now) / 1 day) / 30)`. Display only, billing uses
/// [`add_months`].
pub fn months_left(end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    let Some(end) = end else {
        return 0;
    };
    let diff = (end - now).num_milliseconds();
    if diff <= 0 {
        return 0;
    }
    let days = (diff + DAY_MILLIS - 1) / DAY_MILLIS;
    u32::try_from(days / DISPLAY_MONTH_DAYS).unwrap_or(u32::MAX)
}

/// Local calendar date in the business timezone
pub fn local_date(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

/// (year, zero-based month) in the business timezone
pub fn calendar_month(ts: DateTime<Utc>, tz: Tz) -> (i32, usize) {
    let local = ts.with_timezone(&tz);
    (local.year(), local.month0() as usize)
}

/// Calendar year in the business timezone
pub fn calendar_year(ts: DateTime<Utc>, tz: Tz) -> i32 {
    ts.with_timezone(&tz).year()
}

/// `Jan 10, 2025`; `N/A` when absent
pub fn format_date(ts: Option<DateTime<Utc>>, tz: Tz) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&tz).format("%b %-d, %Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// `YYYY-MM-DD` of the UTC date, empty when absent
pub fn to_input_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// 解析日期字符串 (YYYY-MM-DD) → UTC 零点
pub fn parse_input_date(date: &str) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))?;
    Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)))
}
