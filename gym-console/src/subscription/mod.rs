//! Subscription lifecycle engine
//!
//! - [`renewal`]: billing interval computation and the form draft
//! - [`standing`]: renewal urgency tiers and badges
//! - [`commit`]: validated, atomic register/renew writes

pub mod commit;
pub mod renewal;
pub mod standing;

pub use commit::{RenewalOutcome, commit_renewal, subscription_description};
pub use renewal::{BillingInterval, MAX_DURATION_MONTHS, RenewalDraft, compute_renewal};
pub use standing::{classify, status_badge};
