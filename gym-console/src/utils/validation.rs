//! Input validation helpers
//!
//! Centralized text length constants and validation functions for the
//! member, guest and staff forms.

use validator::ValidateEmail;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Person names: member, guest
pub const MAX_NAME_LEN: usize = 200;

/// Notes and descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Accepted member age range
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 1..=120;

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty"))
            .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate an email address (required).
pub fn validate_email(value: &str, field: &str) -> Result<(), AppError> {
    validate_required_text(value, field, MAX_EMAIL_LEN)?;
    if !value.trim().validate_email() {
        return Err(
            AppError::validation(format!("{field} is not a valid email address"))
                .with_detail("field", field),
        );
    }
    Ok(())
}

/// Validate an optional email address; blank counts as absent.
pub fn validate_optional_email(value: &Option<String>, field: &str) -> Result<(), AppError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => validate_email(v, field),
        _ => Ok(()),
    }
}

/// Validate an optional age.
pub fn validate_age(age: Option<u32>) -> Result<(), AppError> {
    if let Some(age) = age
        && !AGE_RANGE.contains(&age)
    {
        return Err(AppError::validation(format!(
            "age must be between {} and {}, got {age}",
            AGE_RANGE.start(),
            AGE_RANGE.end()
        ))
        .with_detail("field", "age"));
    }
    Ok(())
}

/// Trim an optional field; blank becomes `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
