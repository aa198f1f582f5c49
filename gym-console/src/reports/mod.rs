//! Aggregation / reporting engine
//!
//! Pure functions of the current member and transaction sets. Nothing is
//! cached or updated incrementally; every call is O(n) over its input.

pub mod dashboard;
pub mod monthly;

pub use dashboard::{DashboardStats, dashboard_stats};
pub use monthly::{MonthBucket, MonthlyReport, monthly_report, report_years, top_month};
