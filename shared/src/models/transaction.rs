//! Transaction Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::MemberId;

/// Kind of monetary event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Subscription,
    Guest,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Subscription => "subscription",
            TransactionType::Guest => "guest",
        }
    }
}

/// Ledger entry (流水), stored at `transactions/{id}`
///
/// Never amended after it is written; corrections delete and re-append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Creation timestamp, assigned by the ledger
    pub date: DateTime<Utc>,
    /// Soft reference to the paying member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Append payload; id and date are assigned by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionCreate {
    pub kind: TransactionType,
    pub description: String,
    pub amount: Decimal,
    pub member_phone: Option<String>,
    pub member_id: Option<MemberId>,
    pub note: Option<String>,
}

impl TransactionCreate {
    /// Subscription payment linked to a member
    pub fn subscription(
        description: impl Into<String>,
        amount: Decimal,
        member_id: MemberId,
        member_phone: impl Into<String>,
    ) -> Self {
        Self {
            kind: TransactionType::Subscription,
            description: description.into(),
            amount,
            member_phone: Some(member_phone.into()),
            member_id: Some(member_id),
            note: None,
        }
    }

    /// Guest walk-in fee
    pub fn guest(description: impl Into<String>, amount: Decimal, note: Option<String>) -> Self {
        Self {
            kind: TransactionType::Guest,
            description: description.into(),
            amount,
            member_phone: None,
            member_id: None,
            note,
        }
    }

    pub fn into_transaction(self, id: String, date: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            kind: self.kind,
            description: self.description,
            amount: self.amount,
            date,
            member_phone: self.member_phone,
            member_id: self.member_id,
            note: self.note,
        }
    }
}

/// Guest check-in form (访客登记)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestCheckIn {
    pub name: String,
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
}
