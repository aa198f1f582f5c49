//! Gym console facade
//!
//! Entry point presented to the view layer. Reads come from the live-state
//! cache; mutations go through the lifecycle engine, the ledger and the
//! services, and require a current session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use shared::models::{
    Currency, GuestCheckIn, Member, MemberForm, MemberId, StaffCreate, StaffRecord,
    StandingFilter, SystemConfig, Transaction, TransactionType,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::{
    AccessGate, BootstrapCredential, CredentialProvider, GateState, LoginOutcome, Session,
    SessionEvent, SetupForm,
};
use crate::core::{Config, Confirmation};
use crate::db::DocumentStore;
use crate::db::repository::{TenantDb, member};
use crate::ledger;
use crate::reports::{self, DashboardStats, MonthlyReport};
use crate::services::{self, MemberStanding};
use crate::subscription::{self, RenewalDraft, RenewalOutcome};
use crate::sync::{LiveState, spawn_status_watch};
use crate::utils::money::format_currency;
use crate::utils::{AppError, AppResult, ErrorCode};

struct SessionWatch {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct GymConsole {
    config: Config,
    db: TenantDb,
    provider: Arc<dyn CredentialProvider>,
    gate: Arc<AccessGate>,
    live: Arc<LiveState>,
    session: Arc<RwLock<Option<Session>>>,
    session_watch: Mutex<Option<SessionWatch>>,
    shutdown: CancellationToken,
    status_task: Mutex<Option<JoinHandle<()>>>,
}

impl GymConsole {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn CredentialProvider>,
    ) -> Self {
        let db = TenantDb::new(store, config.tenant_id.clone());
        let gate = Arc::new(AccessGate::new(
            db.clone(),
            provider.clone(),
            BootstrapCredential {
                username: config.bootstrap_username.clone(),
                password: config.bootstrap_password.clone(),
            },
            config.min_password_len,
        ));
        Self {
            config,
            db,
            provider,
            gate,
            live: Arc::new(LiveState::new()),
            session: Arc::new(RwLock::new(None)),
            session_watch: Mutex::new(None),
            shutdown: CancellationToken::new(),
            status_task: Mutex::new(None),
        }
    }

    /// Read the first-run flag and start observing it
    pub async fn start(&self) -> AppResult<GateState> {
        let state = self.gate.refresh().await?;
        let task = spawn_status_watch(&self.db, self.gate.clone(), self.shutdown.clone()).await;
        *self.status_task.lock() = task;
        tracing::info!(tenant = self.db.tenant(), state = ?state, "Console started");
        Ok(state)
    }

    /// End the session and stop every background task
    pub async fn shutdown(&self) {
        self.end_session_locally().await;
        self.shutdown.cancel();
        let task = self.status_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        tracing::info!("Console stopped");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn live(&self) -> &LiveState {
        &self.live
    }

    // ========== Access ==========

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn require_session(&self) -> AppResult<Session> {
        self.session.read().clone().ok_or_else(AppError::not_authenticated)
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> AppResult<LoginOutcome> {
        let outcome = self.gate.submit_login(identifier, secret).await?;
        if let LoginOutcome::Authenticated(session) = &outcome {
            self.begin_session(session.clone()).await;
        }
        Ok(outcome)
    }

    pub async fn complete_setup(&self, form: SetupForm) -> AppResult<Session> {
        let session = self.gate.complete_setup(form).await?;
        self.begin_session(session.clone()).await;
        Ok(session)
    }

    pub fn cancel_setup(&self) {
        self.gate.cancel_setup();
    }

    /// End the session; live subscriptions are torn down first
    pub async fn sign_out(&self) -> AppResult<()> {
        let Some(session) = self.end_session_locally().await else {
            return Err(AppError::not_authenticated());
        };
        crate::security_log!("INFO", "sign_out", uid = session.uid.as_str());
        self.provider.sign_out(&session).await.map_err(|e| {
            tracing::error!(error = %e, "Credential provider sign-out failed");
            AppError::from(e)
        })
    }

    async fn begin_session(&self, session: Session) {
        self.end_session_locally().await;
        *self.session.write() = Some(session.clone());
        self.live.start(&self.db).await;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(watch_session_end(
            session.uid,
            self.provider.subscribe(),
            self.session.clone(),
            self.live.clone(),
            cancel.clone(),
        ));
        *self.session_watch.lock() = Some(SessionWatch { cancel, task });
    }

    async fn end_session_locally(&self) -> Option<Session> {
        let watch = self.session_watch.lock().take();
        if let Some(watch) = watch {
            watch.cancel.cancel();
            let _ = watch.task.await;
        }
        let session = self.session.write().take();
        self.live.stop().await;
        session
    }

    // ========== Reads ==========

    pub fn stats(&self, now: DateTime<Utc>) -> AppResult<DashboardStats> {
        self.require_session()?;
        let data = self.live.snapshot();
        Ok(reports::dashboard_stats(
            &data.members,
            &data.transactions,
            now,
            self.config.timezone,
        ))
    }

    pub fn members(&self) -> AppResult<Vec<Member>> {
        self.require_session()?;
        Ok(self.live.members())
    }

    pub fn search_members(&self, term: &str) -> AppResult<Vec<Member>> {
        let members = self.members()?;
        Ok(services::search(&members, term).into_iter().cloned().collect())
    }

    pub fn expiry_calendar(
        &self,
        filter: StandingFilter,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<MemberStanding>> {
        let members = self.members()?;
        Ok(services::expiry_calendar(&members, filter, now))
    }

    /// Ledger, newest first
    pub fn transactions(&self) -> AppResult<Vec<Transaction>> {
        self.require_session()?;
        Ok(self.live.transactions())
    }

    pub fn transactions_by_type(&self, kind: TransactionType) -> AppResult<Vec<Transaction>> {
        let transactions = self.transactions()?;
        Ok(ledger::list_by_type(&transactions, kind).cloned().collect())
    }

    /// Dashboard recent activity
    pub fn recent_transactions(&self) -> AppResult<Vec<Transaction>> {
        let transactions = self.transactions()?;
        Ok(ledger::recent(&transactions, self.config.recent_transactions)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn monthly_report(&self, year: i32) -> AppResult<MonthlyReport> {
        let transactions = self.transactions()?;
        Ok(reports::monthly_report(&transactions, year, self.config.timezone))
    }

    pub fn report_years(&self, now: DateTime<Utc>) -> Vec<i32> {
        reports::report_years(now, self.config.timezone)
    }

    pub fn staff(&self) -> AppResult<Vec<StaffRecord>> {
        self.require_session()?;
        Ok(self.live.staff())
    }

    pub fn currency(&self) -> Currency {
        self.live.currency(self.config.default_currency)
    }

    pub fn format_amount(&self, amount: Decimal) -> String {
        format_currency(amount, self.currency())
    }

    // ========== Mutations ==========

    /// Recompute the draft dates of an in-progress form
    pub fn refresh_renewal_draft(
        &self,
        member: Option<&Member>,
        form: &mut MemberForm,
        now: DateTime<Utc>,
    ) -> AppResult<RenewalDraft> {
        let committed_end = member.and_then(|m| m.subscription_end_date);
        RenewalDraft::refresh_form(form, committed_end, now, self.config.timezone)
    }

    /// Register (`member_id == None`) or edit/renew a member
    pub async fn renew(
        &self,
        member_id: Option<&MemberId>,
        form: MemberForm,
        now: DateTime<Utc>,
    ) -> AppResult<RenewalOutcome> {
        self.require_session()?;
        let existing = match member_id {
            Some(id) => Some(member::find_by_id(&self.db, id).await?.ok_or_else(|| {
                AppError::with_message(ErrorCode::MemberNotFound, format!("Member {id} not found"))
            })?),
            None => None,
        };
        subscription::commit_renewal(&self.db, existing.as_ref(), form, now, self.config.timezone)
            .await
    }

    pub async fn check_in_guest(
        &self,
        check_in: GuestCheckIn,
        now: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        self.require_session()?;
        ledger::check_in_guest(&self.db, check_in, now).await
    }

    pub async fn delete_member(&self, id: &MemberId, confirmation: Confirmation) -> AppResult<bool> {
        self.require_session()?;
        services::delete_member(&self.db, id, confirmation).await
    }

    pub async fn delete_transaction(&self, id: &str, confirmation: Confirmation) -> AppResult<bool> {
        self.require_session()?;
        ledger::remove(&self.db, id, confirmation).await
    }

    pub async fn set_currency(&self, code: &str) -> AppResult<SystemConfig> {
        self.require_session()?;
        services::set_currency_code(&self.db, code).await
    }

    pub async fn add_staff(&self, data: StaffCreate, now: DateTime<Utc>) -> AppResult<StaffRecord> {
        self.require_session()?;
        services::add_staff(&self.db, self.provider.as_ref(), data, now).await
    }

    pub async fn remove_staff(&self, id: &str, confirmation: Confirmation) -> AppResult<bool> {
        self.require_session()?;
        services::remove_staff(&self.db, id, confirmation).await
    }
}

/// End the local session when the provider reports it signed out
async fn watch_session_end(
    uid: String,
    mut events: tokio::sync::broadcast::Receiver<SessionEvent>,
    session: Arc<RwLock<Option<Session>>>,
    live: Arc<LiveState>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            event = events.recv() => match event {
                Ok(SessionEvent::SignedOut { uid: ended }) if ended == uid => {
                    session.write().take();
                    live.stop().await;
                    crate::security_log!("INFO", "session_ended_by_provider", uid = uid.as_str());
                    return;
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialProvider;
    use crate::db::MemoryStore;
    use chrono::TimeZone;

    fn config() -> Config {
        let mut config = Config::with_overrides("gym", chrono_tz::Tz::UTC);
        config.bootstrap_username = "admin".into();
        config.bootstrap_password = "admin".into();
        config.min_password_len = 6;
        config.default_currency = Currency::Usd;
        config.recent_transactions = 5;
        config
    }

    fn console() -> GymConsole {
        GymConsole::new(
            config(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryCredentialProvider::new(6)),
        )
    }

    fn setup_form() -> SetupForm {
        SetupForm {
            email: "owner@gym.test".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        }
    }

    #[tokio::test]
    async fn test_mutations_require_session() {
        let console = console();
        console.start().await.unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();

        let err = console
            .renew(None, MemberForm::new("Ada", "555"), now)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
        assert_eq!(console.stats(now).unwrap_err().code, ErrorCode::NotAuthenticated);
        assert_eq!(console.set_currency("EUR").await.unwrap_err().code, ErrorCode::NotAuthenticated);
        assert_eq!(console.sign_out().await.unwrap_err().code, ErrorCode::NotAuthenticated);
        console.shutdown().await;
    }

    #[tokio::test]
    async fn test_setup_then_sign_out() {
        let console = console();
        assert_eq!(console.start().await.unwrap(), GateState::Uninitialized);

        assert_eq!(console.login("admin", "admin").await.unwrap(), LoginOutcome::SetupRequired);
        console.complete_setup(setup_form()).await.unwrap();
        assert!(console.session().is_some());
        assert!(console.live().is_running());
        assert_eq!(console.gate_state(), GateState::Initialized);

        console.sign_out().await.unwrap();
        assert!(console.session().is_none());
        assert!(!console.live().is_running());
        console.shutdown().await;
    }

    #[tokio::test]
    async fn test_renew_unknown_member() {
        let console = console();
        console.start().await.unwrap();
        console.login("admin", "admin").await.unwrap();
        console.complete_setup(setup_form()).await.unwrap();

        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let err = console
            .renew(Some(&MemberId::new("ghost")), MemberForm::new("Ada", "555"), now)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberNotFound);
        console.shutdown().await;
    }
}
