//! Shared test utilities for `cashbook`.
//!
//! This module provides helpers for setting up test databases and stores,
//! building records with sensible defaults, and recording what a presenter was asked to show.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use crate::{
    auth::{LocalIdentityProvider, Principal},
    commands::{App, SignUpForm},
    config::settings::AuthSettings,
    core::aggregation::{ChartSeries, DashboardSummary},
    core::validation::{NewCollection, NewEmi},
    entities::user,
    errors::Result,
    presentation::{Presenter, Severity},
    store::{
        CollectionRecord, DatabaseStore, EmiPatch, EmiRecord, RecordId, RecordKind, RecordStore,
        SnapshotFeed,
    },
};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Inserts a user row directly and returns its uid.
///
/// Records reference their owner, so a user must exist before anything is written for it.
pub async fn insert_test_user(db: &DatabaseConnection, email: &str) -> Result<String> {
    let uid = format!("uid-{email}");
    let now = Utc::now();
    user::ActiveModel {
        uid: Set(uid.clone()),
        name: Set("Test User".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(String::new()),
        disabled: Set(false),
        created_at: Set(now),
        last_login: Set(now),
    }
    .insert(db)
    .await?;
    Ok(uid)
}

/// Sets up a store over a fresh database with one user.
/// Returns (store, owner uid).
pub async fn setup_test_store() -> Result<(DatabaseStore, String)> {
    let db = setup_test_db().await?;
    let owner = insert_test_user(&db, "owner@example.com").await?;
    Ok((DatabaseStore::new(db), owner))
}

/// Builds a validated EMI input.
///
/// # Defaults
/// * `due_day`: 5
/// * `start_date`: 2026-01-05
/// * `total_months`: 12
pub fn new_emi(name: &str, amount: f64) -> NewEmi {
    NewEmi {
        name: name.to_string(),
        amount,
        due_day: 5,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        total_months: 12,
    }
}

/// Builds a collection record as the store would return it.
/// Month and year are taken from `date`; the owner is `"test_user"`.
pub fn collection_record(id: RecordId, date: NaiveDate, amount: f64) -> CollectionRecord {
    let created_at = Utc::now();
    CollectionRecord {
        id,
        owner_uid: "test_user".to_string(),
        date,
        amount,
        month: i32::try_from(date.month()).unwrap(),
        year: date.year(),
        created_at,
    }
}

/// Builds an EMI record as the store would return it.
///
/// # Defaults
/// * `name`: `"EMI {id}"`
/// * `due_day`: 5
/// * `paid_date`: 2026-10-05 when `paid`
pub fn emi_record(id: RecordId, amount: f64, paid: bool) -> EmiRecord {
    let now = Utc::now();
    EmiRecord {
        id,
        owner_uid: "test_user".to_string(),
        name: format!("EMI {id}"),
        amount,
        due_day: 5,
        start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        total_months: 12,
        paid_months: 0,
        is_paid_this_month: paid,
        paid_date: paid.then(|| NaiveDate::from_ymd_opt(2026, 10, 5).unwrap()),
        created_at: now,
        last_updated: now,
    }
}

/// Principal owning the records built by [`collection_record`] and [`emi_record`].
pub fn test_principal() -> Principal {
    principal_for("test_user")
}

/// Principal with the given uid.
pub fn principal_for(uid: &str) -> Principal {
    Principal {
        uid: uid.to_string(),
        email: format!("{uid}@example.com"),
        name: Some("Test User".to_string()),
    }
}

/// Polls `check` until it holds, giving background tasks time to run.
/// Returns `false` if it still fails after five seconds.
pub async fn wait_for<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Float comparison for derived money figures.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// One call made on a [`RecordingPresenter`].
#[derive(Debug, Clone)]
pub enum PresenterEvent {
    Collections(Vec<CollectionRecord>),
    Emis(Vec<EmiRecord>),
    Dashboard(DashboardSummary),
    Charts(ChartSeries, ChartSeries),
    Notice(String, Severity),
}

/// Presenter that records every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    fn push(&self, event: PresenterEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Every recorded call, oldest first.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_dashboard(&self) -> Option<DashboardSummary> {
        self.events().into_iter().rev().find_map(|e| match e {
            PresenterEvent::Dashboard(summary) => Some(summary),
            _ => None,
        })
    }

    pub fn last_collections(&self) -> Option<Vec<CollectionRecord>> {
        self.events().into_iter().rev().find_map(|e| match e {
            PresenterEvent::Collections(list) => Some(list),
            _ => None,
        })
    }

    pub fn chart_renders(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, PresenterEvent::Charts(..)))
            .count()
    }

    pub fn notices(&self) -> Vec<(String, Severity)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Notice(message, severity) => Some((message, severity)),
                _ => None,
            })
            .collect()
    }

    pub fn last_notice(&self) -> Option<(String, Severity)> {
        self.notices().pop()
    }
}

impl Presenter for RecordingPresenter {
    fn render_collections(&self, collections: &[CollectionRecord]) {
        self.push(PresenterEvent::Collections(collections.to_vec()));
    }

    fn render_emis(&self, emis: &[EmiRecord]) {
        self.push(PresenterEvent::Emis(emis.to_vec()));
    }

    fn render_dashboard(&self, summary: &DashboardSummary) {
        self.push(PresenterEvent::Dashboard(summary.clone()));
    }

    fn render_charts(&self, collections_vs_emi: &ChartSeries, profit_split: &ChartSeries) {
        self.push(PresenterEvent::Charts(
            collections_vs_emi.clone(),
            profit_split.clone(),
        ));
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.push(PresenterEvent::Notice(message.to_string(), severity));
    }
}

/// Store wrapper that counts write calls and can be told to fail them.
///
/// Subscriptions always pass through to the wrapped store.
pub struct CountingStore {
    inner: DatabaseStore,
    writes: AtomicUsize,
    fail: AtomicBool,
}

impl CountingStore {
    pub fn new(inner: DatabaseStore) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Number of create, update and delete calls that reached the store.
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every later write fail with a store error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.inner.connection()
    }

    fn record_write(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("simulated outage".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn create_collection(&self, owner: &str, new: NewCollection) -> Result<RecordId> {
        self.record_write()?;
        self.inner.create_collection(owner, new).await
    }

    async fn create_emi(&self, owner: &str, new: NewEmi) -> Result<RecordId> {
        self.record_write()?;
        self.inner.create_emi(owner, new).await
    }

    async fn update_emi(&self, owner: &str, id: RecordId, patch: EmiPatch) -> Result<()> {
        self.record_write()?;
        self.inner.update_emi(owner, id, patch).await
    }

    async fn delete(&self, owner: &str, kind: RecordKind, id: RecordId) -> Result<()> {
        self.record_write()?;
        self.inner.delete(owner, kind, id).await
    }

    async fn subscribe_collections(&self, owner: &str) -> Result<SnapshotFeed<CollectionRecord>> {
        self.inner.subscribe_collections(owner).await
    }

    async fn subscribe_emis(&self, owner: &str) -> Result<SnapshotFeed<EmiRecord>> {
        self.inner.subscribe_emis(owner).await
    }
}

/// A signed-out [`App`] and handles on its collaborators.
pub struct TestApp {
    pub app: App,
    pub store: Arc<CountingStore>,
    pub identity: Arc<LocalIdentityProvider>,
    pub presenter: Arc<RecordingPresenter>,
}

/// Builds an [`App`] over a fresh database with sign-up enabled.
pub async fn setup_test_app() -> Result<TestApp> {
    let db = setup_test_db().await?;
    let store = Arc::new(CountingStore::new(DatabaseStore::new(db.clone())));
    let identity = Arc::new(LocalIdentityProvider::new(db, &AuthSettings::default()));
    let presenter = Arc::new(RecordingPresenter::default());
    let app = App::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::clone(&identity) as Arc<dyn crate::auth::IdentityProvider>,
        Arc::clone(&presenter) as Arc<dyn Presenter>,
    );
    Ok(TestApp {
        app,
        store,
        identity,
        presenter,
    })
}

/// A complete sign-up form with password `"hunter22"`.
pub fn sign_up_form(email: &str) -> SignUpForm {
    SignUpForm {
        name: "Asha".to_string(),
        email: email.to_string(),
        password: "hunter22".to_string(),
        confirm_password: "hunter22".to_string(),
    }
}
