//! Member registry views and deletion

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{Member, MemberId, StandingFilter, SubscriptionStanding};

use crate::core::Confirmation;
use crate::db::repository::{TenantDb, member};
use crate::subscription::{classify, status_badge};
use crate::utils::time::months_left;
use crate::utils::{AppError, AppResult, ErrorCode};

/// One row of the subscription calendar
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStanding {
    pub member: Member,
    pub standing: SubscriptionStanding,
    pub months_left: u32,
    pub badge: String,
}

impl MemberStanding {
    pub fn of(member: Member, now: DateTime<Utc>) -> Self {
        let end = member.subscription_end_date;
        let standing = classify(end, now);
        let months_left = months_left(end, now);
        Self {
            badge: status_badge(standing, months_left),
            member,
            standing,
            months_left,
        }
    }
}

/// Case-insensitive name match or phone substring; blank returns everything
pub fn search<'a>(members: &'a [Member], term: &str) -> Vec<&'a Member> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return members.iter().collect();
    }
    members
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&term) || m.phone.contains(&term))
        .collect()
}

/// Members by ascending end date (missing first), filtered by standing
pub fn expiry_calendar(
    members: &[Member],
    filter: StandingFilter,
    now: DateTime<Utc>,
) -> Vec<MemberStanding> {
    let mut rows: Vec<MemberStanding> = members
        .iter()
        .cloned()
        .map(|m| MemberStanding::of(m, now))
        .filter(|row| filter.matches(row.standing))
        .collect();
    rows.sort_by(|a, b| {
        a.member
            .subscription_end_date
            .cmp(&b.member.subscription_end_date)
            .then_with(|| a.member.name.cmp(&b.member.name))
    });
    rows
}

/// Hard delete; ledger entries that reference the member are kept
pub async fn delete_member(
    db: &TenantDb,
    id: &MemberId,
    confirmation: Confirmation,
) -> AppResult<bool> {
    if !confirmation.is_accepted() {
        return Ok(false);
    }
    let removed = member::delete(db, id).await.map_err(|e| {
        tracing::error!(member_id = %id, error = %e, "Failed to delete member");
        AppError::from(e)
    })?;
    if !removed {
        return Err(AppError::with_message(
            ErrorCode::MemberNotFound,
            format!("Member {id} not found"),
        ));
    }
    tracing::info!(member_id = %id, "Member deleted");
    Ok(true)
}
