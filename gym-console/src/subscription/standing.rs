//! Renewal urgency classification

use chrono::{DateTime, Utc};
use shared::models::SubscriptionStanding;

use crate::utils::time::months_left;

/// Classify a member by the end of their billing interval
pub fn classify(end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> SubscriptionStanding {
    match end {
        Some(end) if end > now => {
            if months_left(Some(end), now) <= 1 {
                SubscriptionStanding::Warning
            } else {
                SubscriptionStanding::Active
            }
        }
        _ => SubscriptionStanding::Expired,
    }
}

/// Badge text for the subscription calendar
pub fn status_badge(standing: SubscriptionStanding, months_left: u32) -> String {
    match (standing, months_left) {
        (SubscriptionStanding::Expired, _) => "0 Months Left (Expired)".to_string(),
        (_, 1) => "1 Month Left".to_string(),
        (_, n) => format!("{n} Months Left"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_classify_tiers() {
        let now = now();
        assert_eq!(classify(None, now), SubscriptionStanding::Expired);
        assert_eq!(classify(Some(now - Duration::days(1)), now), SubscriptionStanding::Expired);
        assert_eq!(classify(Some(now), now), SubscriptionStanding::Expired);
        assert_eq!(classify(Some(now + Duration::days(20)), now), SubscriptionStanding::Warning);
        assert_eq!(classify(Some(now + Duration::days(59)), now), SubscriptionStanding::Warning);
        assert_eq!(classify(Some(now + Duration::days(60)), now), SubscriptionStanding::Active);
        assert_eq!(classify(Some(now + Duration::days(90)), now), SubscriptionStanding::Active);
    }

    #[test]
    fn test_classify_is_pure() {
        let now = now();
        let end = Some(now + Duration::days(45));
        assert_eq!(classify(end, now), classify(end, now));
    }

    #[test]
    fn test_status_badge() {
        assert_eq!(status_badge(SubscriptionStanding::Expired, 0), "0 Months Left (Expired)");
        assert_eq!(status_badge(SubscriptionStanding::Warning, 0), "0 Months Left");
        assert_eq!(status_badge(SubscriptionStanding::Warning, 1), "1 Month Left");
        assert_eq!(status_badge(SubscriptionStanding::Active, 3), "3 Months Left");
    }
}
