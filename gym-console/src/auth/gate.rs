//! Access gate - first-run bootstrap and login routing
//!
//! ```text
//! Uninitialized ──sentinel──▶ SetupInProgress ──admin created──▶ Initialized
//!       ▲                            │
//!       └──────── cancel_setup ──────┘
//! ```
//!
//! `Initialized` is persisted in `settings/system` and never reset. Every
//! credential other than the sentinel goes to the provider.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::models::StaffRole;

use super::provider::{AuthError, CredentialProvider, Session};
use crate::db::WriteBatch;
use crate::db::repository::{TenantDb, settings, staff};
use crate::utils::validation::{MAX_PASSWORD_LEN, validate_email};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    Uninitialized,
    SetupInProgress,
    Initialized,
}

/// Result of a login submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Provider accepted the credential
    Authenticated(Session),
    /// Sentinel accepted; the setup form should be shown
    SetupRequired,
}

/// Fixed bootstrap login
#[derive(Debug, Clone)]
pub struct BootstrapCredential {
    pub username: String,
    pub password: String,
}

impl BootstrapCredential {
    fn matches(&self, identifier: &str, secret: &str) -> bool {
        identifier.trim() == self.username && secret == self.password
    }
}

/// First administrator form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct AccessGate {
    db: TenantDb,
    provider: Arc<dyn CredentialProvider>,
    bootstrap: BootstrapCredential,
    min_password_len: usize,
    state: Mutex<GateState>,
}

impl AccessGate {
    pub fn new(
        db: TenantDb,
        provider: Arc<dyn CredentialProvider>,
        bootstrap: BootstrapCredential,
        min_password_len: usize,
    ) -> Self {
        Self {
            db,
            provider,
            bootstrap,
            min_password_len,
            state: Mutex::new(GateState::Uninitialized),
        }
    }

    pub fn state(&self) -> GateState {
        *self.state.lock()
    }

    /// Apply an observed `settings/system` value
    pub fn observe_initialized(&self, initialized: bool) {
        let mut state = self.state.lock();
        if initialized {
            *state = GateState::Initialized;
        }
    }

    /// Re-read the persisted flag
    pub async fn refresh(&self) -> AppResult<GateState> {
        let status = settings::get_status(&self.db).await?;
        self.observe_initialized(status.initialized);
        Ok(self.state())
    }

    /// Route a login submission
    ///
    /// If the flag cannot be read, the last observed state is used.
    pub async fn submit_login(&self, identifier: &str, secret: &str) -> AppResult<LoginOutcome> {
        let state = match self.refresh().await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read system status, using last known state");
                self.state()
            }
        };
        let initialized = state == GateState::Initialized;

        if self.bootstrap.matches(identifier, secret) {
            if initialized {
                crate::security_log!("WARN", "setup_sentinel_rejected", tenant = self.db.tenant());
                return Err(AppError::setup_already_complete());
            }
            *self.state.lock() = GateState::SetupInProgress;
            crate::security_log!("INFO", "setup_started", tenant = self.db.tenant());
            return Ok(LoginOutcome::SetupRequired);
        }

        match self.provider.sign_in(identifier, secret).await {
            Ok(session) => {
                crate::security_log!("INFO", "login_success", uid = session.uid.as_str());
                Ok(LoginOutcome::Authenticated(session))
            }
            Err(e) => {
                let err = AppError::from(e);
                if err.is(ErrorCode::InvalidCredentials) {
                    crate::security_log!("WARN", "login_failed", identifier = identifier.trim());
                } else {
                    tracing::error!(error = %err, "Credential provider failed during login");
                }
                Err(err)
            }
        }
    }

    fn validate_setup(&self, form: &SetupForm) -> AppResult<()> {
        validate_email(&form.email, "email")?;
        if form.password != form.confirm_password {
            return Err(AppError::with_message(
                ErrorCode::PasswordMismatch,
                "Passwords do not match.",
            ));
        }
        let len = form.password.chars().count();
        if len < self.min_password_len {
            return Err(AppError::with_message(
                ErrorCode::PasswordTooShort,
                format!("Password must be at least {} characters.", self.min_password_len),
            )
            .with_detail("minLength", self.min_password_len));
        }
        if len > MAX_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password is too long (max {MAX_PASSWORD_LEN})"
            )));
        }
        Ok(())
    }

    /// Create the first administrator and persist `initialized: true`
    ///
    /// The returned session is the new current session.
    pub async fn complete_setup(&self, form: SetupForm) -> AppResult<Session> {
        if self.state() != GateState::SetupInProgress {
            return Err(AppError::new(ErrorCode::SetupNotStarted));
        }
        if self.refresh().await? == GateState::Initialized {
            return Err(AppError::setup_already_complete());
        }
        self.validate_setup(&form)?;

        let email = form.email.trim();
        let session = match self.provider.create_credential(email, &form.password).await {
            Ok(session) => session,
            // left behind by an earlier attempt whose flag write failed
            Err(AuthError::AlreadyExists(existing)) => {
                match self.provider.sign_in(email, &form.password).await {
                    Ok(session) => {
                        tracing::warn!(email, "Resuming setup with existing credential");
                        session
                    }
                    Err(_) => return Err(AuthError::AlreadyExists(existing).into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        let batch = settings::stage_mark_initialized(&self.db, WriteBatch::new())?;
        let (batch, _) = staff::stage_create(
            &self.db,
            batch,
            &session.email,
            StaffRole::Admin,
            session.signed_in_at,
        )?;
        if let Err(e) = self.db.store().commit(batch).await {
            tracing::error!(email = %session.email, error = %e, "Failed to persist setup completion");
            return Err(e.into());
        }

        *self.state.lock() = GateState::Initialized;
        crate::security_log!("INFO", "setup_completed", uid = session.uid.as_str());
        Ok(session)
    }

    /// Back to login; only leaves `SetupInProgress`
    pub fn cancel_setup(&self) {
        let mut state = self.state.lock();
        if *state == GateState::SetupInProgress {
            *state = GateState::Uninitialized;
        }
    }
}
