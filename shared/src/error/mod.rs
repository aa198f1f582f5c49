//! Unified error system for the gym console
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`Presentation`]: Where a failure is shown (inline, alert, log only)
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication / access gate errors
//! - 3xxx: Member errors
//! - 4xxx: Ledger errors
//! - 5xxx: Settings and staff errors
//! - 9xxx: System / store errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::SubscriptionDatesInvalid);
//! assert_eq!(err.code.code(), 3004);
//!
//! let err = AppError::validation("Name is required").with_detail("field", "name");
//! assert!(err.details.is_some());
//! ```

mod category;
mod codes;
mod types;

pub use category::{ErrorCategory, Presentation};
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
