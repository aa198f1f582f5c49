//! Credential provider seam
//!
//! The console never stores secrets itself; it hands identifier/secret pairs
//! to a provider and receives an opaque [`Session`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::utils::{AppError, ErrorCode};

/// Authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Session-changed notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut { uid: String },
}

/// Provider error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown identifier or wrong secret; never distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credential already exists: {0}")]
    AlreadyExists(String),

    #[error("Secret must be at least {0} characters")]
    WeakSecret(usize),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::invalid_credentials(),
            AuthError::AlreadyExists(id) => {
                AppError::already_exists("Account").with_detail("email", id)
            }
            AuthError::WeakSecret(min) => AppError::with_message(
                ErrorCode::PasswordTooShort,
                format!("Password must be at least {min} characters."),
            )
            .with_detail("minLength", min),
            AuthError::InvalidIdentifier(id) => {
                AppError::validation(format!("{id} is not a valid email address"))
                    .with_detail("field", "email")
            }
            AuthError::Provider(msg) => AppError::with_message(ErrorCode::AuthProviderError, msg),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

/// External authentication service contract
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Verify a credential pair and start a session
    async fn sign_in(&self, identifier: &str, secret: &str) -> AuthResult<Session>;

    /// Create a credential; the caller decides whether the returned session
    /// becomes current
    async fn create_credential(&self, identifier: &str, secret: &str) -> AuthResult<Session>;

    async fn sign_out(&self, session: &Session) -> AuthResult<()>;

    /// Session-changed notifications
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_mapping() {
        let err: AppError = AuthError::InvalidCredentials.into();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        assert_eq!(err.message, "Invalid credentials.");

        let err: AppError = AuthError::WeakSecret(6).into();
        assert_eq!(err.code, ErrorCode::PasswordTooShort);

        let err: AppError = AuthError::AlreadyExists("a@b.test".into()).into();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
    }
}
