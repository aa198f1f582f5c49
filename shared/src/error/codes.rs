//! Unified error codes for the gym console
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication / access gate errors
//! - 3xxx: Member errors
//! - 4xxx: Ledger errors
//! - 5xxx: Settings and staff errors
//! - 9xxx: System / store errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// No session is active
    NotAuthenticated = 1001,
    /// Invalid credentials (never distinguishes unknown user from bad secret)
    InvalidCredentials = 1002,
    /// Sentinel credential used after first-run setup
    SetupAlreadyComplete = 1003,
    /// Setup step attempted outside the setup flow
    SetupNotStarted = 1004,
    /// Password too short
    PasswordTooShort = 1005,
    /// Password and confirmation differ
    PasswordMismatch = 1006,

    // ==================== 3xxx: Member ====================
    /// Member not found
    MemberNotFound = 3001,
    /// Phone number already registered to another member
    MemberPhoneExists = 3002,
    /// Phone number cannot change after registration
    MemberPhoneImmutable = 3003,
    /// Subscription end date precedes start date
    SubscriptionDatesInvalid = 3004,
    /// Duration must be at least one month
    SubscriptionDurationInvalid = 3005,

    // ==================== 4xxx: Ledger ====================
    /// Transaction not found
    TransactionNotFound = 4001,
    /// Amount negative or not finite
    InvalidAmount = 4002,

    // ==================== 5xxx: Settings / Staff ====================
    /// Currency code not supported
    CurrencyNotSupported = 5001,
    /// Staff entry not found
    StaffNotFound = 5002,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Document store write failed
    StoreWriteFailed = 9002,
    /// Document store subscription failed
    StoreSubscriptionFailed = 9003,
    /// Document store read failed
    StoreReadFailed = 9004,
    /// Credential provider unavailable
    AuthProviderError = 9005,
    /// Configuration error
    ConfigError = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid credentials.",
            ErrorCode::SetupAlreadyComplete => {
                "Setup already complete. Login with your admin email."
            }
            ErrorCode::SetupNotStarted => "First-run setup has not been started",
            ErrorCode::PasswordTooShort => "Password must be at least 6 characters.",
            ErrorCode::PasswordMismatch => "Passwords do not match.",

            // Member
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::MemberPhoneExists => "Phone number is already registered",
            ErrorCode::MemberPhoneImmutable => "Phone number cannot be changed",
            ErrorCode::SubscriptionDatesInvalid => {
                "Subscription End Date cannot be earlier than Start Date."
            }
            ErrorCode::SubscriptionDurationInvalid => "Duration must be at least one month",

            // Ledger
            ErrorCode::TransactionNotFound => "Transaction not found",
            ErrorCode::InvalidAmount => "Amount must be a non-negative number",

            // Settings / Staff
            ErrorCode::CurrencyNotSupported => "Currency is not supported",
            ErrorCode::StaffNotFound => "Staff entry not found",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StoreWriteFailed => "Failed to save changes",
            ErrorCode::StoreSubscriptionFailed => "Live data subscription failed",
            ErrorCode::StoreReadFailed => "Failed to load data",
            ErrorCode::AuthProviderError => "Authentication service error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::SetupAlreadyComplete),
            1004 => Ok(ErrorCode::SetupNotStarted),
            1005 => Ok(ErrorCode::PasswordTooShort),
            1006 => Ok(ErrorCode::PasswordMismatch),

            // Member
            3001 => Ok(ErrorCode::MemberNotFound),
            3002 => Ok(ErrorCode::MemberPhoneExists),
            3003 => Ok(ErrorCode::MemberPhoneImmutable),
            3004 => Ok(ErrorCode::SubscriptionDatesInvalid),
            3005 => Ok(ErrorCode::SubscriptionDurationInvalid),

            // Ledger
            4001 => Ok(ErrorCode::TransactionNotFound),
            4002 => Ok(ErrorCode::InvalidAmount),

            // Settings / Staff
            5001 => Ok(ErrorCode::CurrencyNotSupported),
            5002 => Ok(ErrorCode::StaffNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StoreWriteFailed),
            9003 => Ok(ErrorCode::StoreSubscriptionFailed),
            9004 => Ok(ErrorCode::StoreReadFailed),
            9005 => Ok(ErrorCode::AuthProviderError),
            9006 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::InvalidCredentials.code(), 1002);
        assert_eq!(ErrorCode::SetupAlreadyComplete.code(), 1003);
        assert_eq!(ErrorCode::SubscriptionDatesInvalid.code(), 3004);
        assert_eq!(ErrorCode::StoreWriteFailed.code(), 9002);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(3002), Ok(ErrorCode::MemberPhoneExists));
        assert_eq!(
            ErrorCode::try_from(9003),
            Ok(ErrorCode::StoreSubscriptionFailed)
        );
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::InvalidCredentials).unwrap();
        assert_eq!(json, "1002");
        let code: ErrorCode = serde_json::from_str("4002").unwrap();
        assert_eq!(code, ErrorCode::InvalidAmount);
        assert!(serde_json::from_str::<ErrorCode>("4242").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::NotFound.to_string(), "E0003");
        assert_eq!(ErrorCode::StoreWriteFailed.to_string(), "E9002");
    }

    #[test]
    fn test_generic_credential_message() {
        // Unknown user and wrong password share one message
        assert_eq!(ErrorCode::InvalidCredentials.message(), "Invalid credentials.");
    }
}
