use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use gym_console::auth::{LoginOutcome, SetupForm};
use gym_console::db::Collection;
use gym_console::{
    Config, Confirmation, CredentialProvider, ErrorCode, GymConsole, MemoryCredentialProvider,
    MemoryStore,
};
use rust_decimal::Decimal;
use shared::models::{
    Currency, GuestCheckIn, MemberForm, StaffCreate, StandingFilter, SubscriptionStanding,
    TransactionType,
};

const TENANT: &str = "test-gym";

struct Harness {
    store: MemoryStore,
    provider: Arc<MemoryCredentialProvider>,
    console: GymConsole,
}

fn config() -> Config {
    let mut config = Config::with_overrides(TENANT, chrono_tz::Tz::UTC);
    config.bootstrap_username = "admin".into();
    config.bootstrap_password = "admin".into();
    config.min_password_len = 6;
    config.default_currency = Currency::Usd;
    config.recent_transactions = 5;
    config
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
}

/// Fresh console, first administrator created and signed in
async fn signed_in() -> Harness {
    let store = MemoryStore::new();
    let provider = Arc::new(MemoryCredentialProvider::new(6));
    let console = GymConsole::new(config(), Arc::new(store.clone()), provider.clone());
    console.start().await.unwrap();

    assert_eq!(
        console.login("admin", "admin").await.unwrap(),
        LoginOutcome::SetupRequired
    );
    console
        .complete_setup(SetupForm {
            email: "owner@gym.test".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        })
        .await
        .unwrap();

    Harness {
        store,
        provider,
        console,
    }
}

/// Wait until the live cache satisfies `cond`
async fn settle(console: &GymConsole, cond: impl Fn(&GymConsole) -> bool) {
    let mut rx = console.live().subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond(console) {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("live state did not settle");
}

fn paid_form(name: &str, phone: &str, amount: i64, months: u32) -> MemberForm {
    let mut form = MemberForm::new(name, phone);
    form.payment_amount = Some(Decimal::from(amount));
    form.duration_months = months;
    form
}

#[tokio::test]
async fn test_register_then_renew_scenario() {
    let h = signed_in().await;
    let console = &h.console;

    // Register on 2025-01-10: $100 for one month
    let jan10 = at(2025, 1, 10);
    let mut form = paid_form("Ada", "555-0123", 100, 1);
    console.refresh_renewal_draft(None, &mut form, jan10).unwrap();
    let registered = console.renew(None, form, jan10).await.unwrap();
    assert_eq!(registered.member.subscription_end_date, Some(at(2025, 2, 10)));

    settle(console, |c| {
        c.members().unwrap().len() == 1 && c.transactions().unwrap().len() == 1
    })
    .await;
    let txs = console.transactions().unwrap();
    assert_eq!(txs[0].kind, TransactionType::Subscription);
    assert_eq!(txs[0].amount, Decimal::from(100));

    let stats = console.stats(at(2025, 1, 15)).unwrap();
    assert_eq!(stats.revenue, Decimal::from(100));
    assert_eq!(stats.active_members, 1);
    assert_eq!(console.format_amount(stats.revenue), "$100.00");

    // Renew on 2025-02-01 while time is left: stacks onto Feb 10
    let feb1 = at(2025, 2, 1);
    let member = registered.member;
    let mut form = MemberForm::for_member(&member);
    form.payment_amount = Some(Decimal::from(180));
    form.duration_months = 1;
    console.refresh_renewal_draft(Some(&member), &mut form, feb1).unwrap();
    // operator changes the duration; recompute starts from the committed end again
    form.duration_months = 2;
    console.refresh_renewal_draft(Some(&member), &mut form, feb1).unwrap();
    assert_eq!(form.start_date, Some(at(2025, 2, 10)));
    assert_eq!(form.end_date, Some(at(2025, 4, 10)));

    let renewed = console.renew(Some(&member.id), form, feb1).await.unwrap();
    assert_eq!(renewed.member.id, member.id);
    assert_eq!(renewed.member.join_date, jan10);
    assert_eq!(renewed.member.subscription_start_date, Some(at(2025, 2, 10)));
    assert_eq!(renewed.member.subscription_end_date, Some(at(2025, 4, 10)));
    assert_eq!(
        renewed.transaction.unwrap().description,
        "Subscription: Ada (Feb 10, 2025 - Apr 10, 2025)"
    );

    settle(console, |c| c.transactions().unwrap().len() == 2).await;
    let subs = console
        .transactions_by_type(TransactionType::Subscription)
        .unwrap();
    assert_eq!(subs.len(), 2);

    let calendar = console
        .expiry_calendar(StandingFilter::All, feb1)
        .unwrap();
    assert_eq!(calendar[0].standing, SubscriptionStanding::Active);
    assert_eq!(calendar[0].badge, "2 Months Left");
    h.console.shutdown().await;
}

#[tokio::test]
async fn test_guests_and_reports() {
    let h = signed_in().await;
    let console = &h.console;

    console
        .renew(None, paid_form("Ada", "555-0001", 100, 1), at(2025, 1, 10))
        .await
        .unwrap();
    console
        .renew(None, paid_form("Bob", "555-0002", 80, 1), at(2025, 2, 3))
        .await
        .unwrap();
    for day in [15, 15, 16] {
        console
            .check_in_guest(
                GuestCheckIn {
                    name: "Walk-in".into(),
                    amount: Some(Decimal::from_str("12.50").unwrap()),
                    note: None,
                },
                at(2025, 1, day),
            )
            .await
            .unwrap();
    }
    // different year
    console
        .check_in_guest(
            GuestCheckIn {
                name: "Old".into(),
                amount: Some(Decimal::from(999)),
                note: None,
            },
            at(2024, 12, 31),
        )
        .await
        .unwrap();

    settle(console, |c| c.transactions().unwrap().len() == 6).await;

    let stats = console.stats(at(2025, 1, 15)).unwrap();
    assert_eq!(stats.guests_today, 2);
    assert_eq!(stats.revenue, Decimal::from(100) + Decimal::from_str("37.50").unwrap());

    let report = console.monthly_report(2025).unwrap();
    assert_eq!(report.months[0].revenue, Decimal::from_str("137.50").unwrap());
    assert_eq!(report.months[0].guest_count, 3);
    assert_eq!(report.months[0].subscription_count, 1);
    assert_eq!(report.months[1].revenue, Decimal::from(80));
    assert_eq!(report.top_month().label, "Jan");
    assert_eq!(report.total_revenue(), Decimal::from_str("217.50").unwrap());

    let recent = console.recent_transactions().unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(recent[0].date, at(2025, 2, 3));

    // delete the stray entry
    let old = console
        .transactions_by_type(TransactionType::Guest)
        .unwrap()
        .into_iter()
        .find(|t| t.description == "Guest: Old")
        .unwrap();
    assert!(
        !console
            .delete_transaction(&old.id, Confirmation::Declined)
            .await
            .unwrap()
    );
    assert!(
        console
            .delete_transaction(&old.id, Confirmation::Accepted)
            .await
            .unwrap()
    );
    settle(console, |c| c.transactions().unwrap().len() == 5).await;
    h.console.shutdown().await;
}

#[tokio::test]
async fn test_member_delete_keeps_transactions() {
    let h = signed_in().await;
    let console = &h.console;

    let outcome = console
        .renew(None, paid_form("Ada", "555-0001", 100, 1), at(2025, 1, 10))
        .await
        .unwrap();
    assert!(
        console
            .delete_member(&outcome.member.id, Confirmation::Accepted)
            .await
            .unwrap()
    );
    settle(console, |c| {
        c.members().unwrap().is_empty() && c.transactions().unwrap().len() == 1
    })
    .await;
    assert_eq!(h.store.count(TENANT, Collection::Transactions), 1);

    // the phone is free again
    console
        .renew(None, paid_form("Ada", "555-0001", 100, 1), at(2025, 1, 11))
        .await
        .unwrap();
    h.console.shutdown().await;
}

#[tokio::test]
async fn test_write_failure_leaves_nothing_behind() {
    let h = signed_in().await;
    h.store.fail_writes(Some("permission denied"));

    let err = h
        .console
        .renew(None, paid_form("Ada", "555-0001", 100, 1), at(2025, 1, 10))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StoreWriteFailed);
    assert!(err.code.is_user_visible());
    assert_eq!(h.store.count(TENANT, Collection::Members), 0);
    assert_eq!(h.store.count(TENANT, Collection::Transactions), 0);

    let err = h.console.set_currency("EUR").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::StoreWriteFailed);
    assert_eq!(h.console.currency(), Currency::Usd);
    h.console.shutdown().await;
}

#[tokio::test]
async fn test_subscription_failure_keeps_last_data() {
    let h = signed_in().await;
    let console = &h.console;

    console
        .renew(None, paid_form("Ada", "555-0001", 100, 1), at(2025, 1, 10))
        .await
        .unwrap();
    settle(console, |c| c.transactions().unwrap().len() == 1).await;

    h.store
        .break_watches(TENANT, Collection::Transactions, "permission denied");
    console
        .renew(None, paid_form("Bob", "555-0002", 50, 1), at(2025, 1, 11))
        .await
        .unwrap();
    settle(console, |c| c.members().unwrap().len() == 2).await;

    // the ledger view is stale but still served
    assert_eq!(console.transactions().unwrap().len(), 1);
    assert_eq!(h.store.count(TENANT, Collection::Transactions), 2);
    assert_eq!(
        console.stats(at(2025, 1, 15)).unwrap().revenue,
        Decimal::from(100)
    );
    h.console.shutdown().await;
}

#[tokio::test]
async fn test_currency_and_staff_administration() {
    let h = signed_in().await;
    let console = &h.console;
    let owner = console.session().unwrap();

    let config = console.set_currency("gbp").await.unwrap();
    assert_eq!(config.version, 1);
    settle(console, |c| c.currency() == Currency::Gbp).await;
    assert_eq!(console.format_amount(Decimal::from(1500)), "£1,500.00");

    let desk = console
        .add_staff(
            StaffCreate {
                email: "desk@gym.test".into(),
                password: "secret2".into(),
            },
            at(2025, 1, 2),
        )
        .await
        .unwrap();
    // adding staff does not switch the session
    assert_eq!(console.session().unwrap().uid, owner.uid);
    settle(console, |c| c.staff().unwrap().len() == 2).await;

    assert!(
        console
            .remove_staff(&desk.id, Confirmation::Accepted)
            .await
            .unwrap()
    );
    settle(console, |c| c.staff().unwrap().len() == 1).await;

    // the credential outlives the directory entry
    console.sign_out().await.unwrap();
    match console.login("desk@gym.test", "secret2").await.unwrap() {
        LoginOutcome::Authenticated(session) => assert_eq!(session.email, "desk@gym.test"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    h.console.shutdown().await;
}

#[tokio::test]
async fn test_gate_after_initialization() {
    let h = signed_in().await;
    let console = &h.console;
    console.sign_out().await.unwrap();

    let err = console.login("admin", "admin").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::SetupAlreadyComplete);

    let err = console.login("owner@gym.test", "wrong").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidCredentials);
    let unknown = console.login("nobody@gym.test", "secret1").await.unwrap_err();
    assert_eq!(unknown.message, err.message);
    assert!(console.session().is_none());
    h.console.shutdown().await;
}

#[tokio::test]
async fn test_provider_sign_out_ends_session() {
    let h = signed_in().await;
    let session = h.console.session().unwrap();

    h.provider.sign_out(&session).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while h.console.session().is_some() || h.console.live().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session was not ended");

    assert!(!h.console.live().is_running());
    let err = h.console.members().unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAuthenticated);
    h.console.shutdown().await;
}
