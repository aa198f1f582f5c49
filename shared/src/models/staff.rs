//! Staff Directory Model
//!
//! Directory entries are informational. Removing one does not revoke the
//! login credential held by the credential provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Admin,
    Staff,
}

/// Staff directory entry, stored at `staff/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecord {
    pub id: String,
    pub email: String,
    pub role: StaffRole,
    pub added_at: DateTime<Utc>,
}

/// Create staff account payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCreate {
    pub email: String,
    pub password: String,
}
