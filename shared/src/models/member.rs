//! Member Model

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Member identity (会员编号)
///
/// Assigned once at registration and never derived from contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocate a fresh identifier
    pub fn generate() -> Self {
        Self(format!("m{}", crate::util::snowflake_id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Member lifecycle status. Suspension is not modeled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Active,
}

/// Member entity, stored at `members/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub address: Option<String>,
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub subscription_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: MemberStatus,
}

impl Member {
    /// True when the billing interval ends strictly after `now`
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.subscription_end_date.is_some_and(|end| end > now)
    }
}

/// Register / edit / renew form (会员登记表单)
///
/// `start_date` / `end_date` hold whatever the operator last saw in the
/// form: either the values derived from the payment or manual overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberForm {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub address: Option<String>,
    /// Payment taken with this submission; `None` or zero means no payment
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub payment_amount: Option<Decimal>,
    #[serde(default = "default_duration")]
    pub duration_months: u32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

fn default_duration() -> u32 {
    1
}

impl MemberForm {
    /// Blank registration form
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            duration_months: 1,
            ..Default::default()
        }
    }

    /// Form pre-filled from an existing member (edit / renew)
    pub fn for_member(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            phone: member.phone.clone(),
            email: member.email.clone(),
            age: member.age,
            address: member.address.clone(),
            payment_amount: None,
            duration_months: 1,
            start_date: member.subscription_start_date,
            end_date: member.subscription_end_date,
        }
    }

    /// Payment entered with this submission, if strictly positive
    pub fn payment(&self) -> Option<Decimal> {
        self.payment_amount.filter(|a| *a > Decimal::ZERO)
    }
}

/// Renewal urgency tier (续费状态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStanding {
    /// No end date, or end date not after now
    Expired,
    /// At most one (30-day) month left
    Warning,
    /// More than one month left
    Active,
}

/// Expiry calendar filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandingFilter {
    #[default]
    All,
    Expired,
    Warning,
    Active,
}

impl StandingFilter {
    pub fn matches(&self, standing: SubscriptionStanding) -> bool {
        match self {
            StandingFilter::All => true,
            StandingFilter::Expired => standing == SubscriptionStanding::Expired,
            StandingFilter::Warning => standing == SubscriptionStanding::Warning,
            StandingFilter::Active => standing == SubscriptionStanding::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Member {
        Member {
            id: MemberId::new("m1"),
            name: "Ada".into(),
            phone: "555-0123".into(),
            email: None,
            age: Some(31),
            address: None,
            join_date: Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap(),
            subscription_start_date: Some(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()),
            subscription_end_date: Some(Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap()),
            status: MemberStatus::Active,
        }
    }

    #[test]
    fn test_member_document_layout() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], "m1");
        assert_eq!(json["status"], "active");
        assert!(json.get("subscriptionEndDate").is_some());
        assert!(json.get("joinDate").is_some());
    }

    #[test]
    fn test_member_is_current() {
        let m = sample();
        assert!(m.is_current(Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()));
        assert!(!m.is_current(Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap()));
    }

    #[test]
    fn test_form_payment_ignores_zero() {
        let mut form = MemberForm::new("Ada", "555");
        assert_eq!(form.payment(), None);
        form.payment_amount = Some(Decimal::ZERO);
        assert_eq!(form.payment(), None);
        form.payment_amount = Some(Decimal::from(100));
        assert_eq!(form.payment(), Some(Decimal::from(100)));
    }

    #[test]
    fn test_form_defaults_duration_when_missing() {
        let form: MemberForm = serde_json::from_str(r#"{"name":"Ada","phone":"555"}"#).unwrap();
        assert_eq!(form.duration_months, 1);
    }

    #[test]
    fn test_standing_filter() {
        assert!(StandingFilter::All.matches(SubscriptionStanding::Expired));
        assert!(StandingFilter::Warning.matches(SubscriptionStanding::Warning));
        assert!(!StandingFilter::Active.matches(SubscriptionStanding::Warning));
    }
}
