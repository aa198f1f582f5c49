//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 3xxx: Member errors
/// - 4xxx: Ledger errors
/// - 5xxx: Settings errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Member errors (3xxx)
    Member,
    /// Ledger errors (4xxx)
    Ledger,
    /// Settings and staff errors (5xxx)
    Settings,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            1000..2000 => Self::Auth,
            3000..4000 => Self::Member,
            4000..5000 => Self::Ledger,
            5000..6000 => Self::Settings,
            9000.. => Self::System,
            _ => Self::General,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Member => "member",
            Self::Ledger => "ledger",
            Self::Settings => "settings",
            Self::System => "system",
        }
    }
}

/// How a failure reaches the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Shown inline next to the form that caused it
    Inline,
    /// Shown as a blocking alert
    Alert,
    /// Logged only
    Silent,
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }

    /// Where this error is reported to the operator
    pub fn presentation(&self) -> Presentation {
        match self {
            ErrorCode::StoreSubscriptionFailed => Presentation::Silent,
            ErrorCode::StoreWriteFailed
            | ErrorCode::StoreReadFailed
            | ErrorCode::InternalError
            | ErrorCode::AuthProviderError
            | ErrorCode::ConfigError => Presentation::Alert,
            _ => Presentation::Inline,
        }
    }

    /// Whether the operator ever sees this error
    pub fn is_user_visible(&self) -> bool {
        self.presentation() != Presentation::Silent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1002), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(3004), ErrorCategory::Member);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Ledger);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Settings);
        assert_eq!(ErrorCategory::from_code(9002), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::SetupAlreadyComplete.category(),
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorCode::SubscriptionDatesInvalid.category(),
            ErrorCategory::Member
        );
        assert_eq!(ErrorCode::InvalidAmount.category(), ErrorCategory::Ledger);
        assert_eq!(
            ErrorCode::StoreWriteFailed.category(),
            ErrorCategory::System
        );
    }

    #[test]
    fn test_presentation() {
        assert_eq!(
            ErrorCode::ValidationFailed.presentation(),
            Presentation::Inline
        );
        assert_eq!(
            ErrorCode::InvalidCredentials.presentation(),
            Presentation::Inline
        );
        assert_eq!(
            ErrorCode::StoreWriteFailed.presentation(),
            Presentation::Alert
        );
        assert!(!ErrorCode::StoreSubscriptionFailed.is_user_visible());
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Ledger).unwrap();
        assert_eq!(json, "\"ledger\"");
        let category: ErrorCategory = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(category, ErrorCategory::Member);
    }
}
