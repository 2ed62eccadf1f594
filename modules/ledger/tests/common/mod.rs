//! Shared helpers for ledger integration tests
#![allow(dead_code)]

use axum::{body::Body, http::Request, response::Response, Router};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use ledger_rs::contracts::LedgerEventV1;
use ledger_rs::metrics::Metrics;
use ledger_rs::models::{Account, AccountType, NewAccount, SourceReference};
use ledger_rs::services::event_resolver::WellKnownAccounts;
use ledger_rs::services::retry::RetryConfig;
use ledger_rs::{router, AppState, InMemoryLedgerStore, LedgerStore, PostingEngine};

/// The standard test chart, keyed by code
pub const STANDARD_CHART: &[(&str, &str, AccountType)] = &[
    ("1110", "Cash on Hand", AccountType::Asset),
    ("1120", "Bank", AccountType::Asset),
    ("1500", "Fixed Assets", AccountType::Asset),
    ("2100", "Accounts Payable", AccountType::Liability),
    ("3000", "Owner's Equity", AccountType::Equity),
    ("4000", "Sales Revenue", AccountType::Revenue),
    ("6100", "Operating Expenses", AccountType::Expense),
];

pub struct TestLedger {
    pub store: InMemoryLedgerStore,
    pub engine: Arc<PostingEngine>,
    pub metrics: Metrics,
}

/// Retries fast enough for tests
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(10),
    }
}

pub fn ledger() -> TestLedger {
    let store = InMemoryLedgerStore::new();
    let metrics = Metrics::new();
    let shared: Arc<dyn LedgerStore> = Arc::new(store.clone());
    let engine = PostingEngine::new(shared, WellKnownAccounts::default())
        .with_retry(fast_retry())
        .with_metrics(metrics.clone());
    TestLedger {
        store,
        engine: Arc::new(engine),
        metrics,
    }
}

pub fn app(ledger: &TestLedger) -> Router {
    router(Arc::new(AppState {
        engine: ledger.engine.clone(),
        metrics: ledger.metrics.clone(),
    }))
}

pub async fn seed_account(
    store: &dyn LedgerStore,
    company_id: Uuid,
    code: &str,
    name: &str,
    account_type: AccountType,
) -> Account {
    store
        .create_account(NewAccount {
            company_id,
            code: code.to_string(),
            name: name.to_string(),
            account_type,
            parent_id: None,
        })
        .await
        .expect("seed account")
}

/// Seed the standard chart, skipping the listed codes
pub async fn seed_chart_except(store: &dyn LedgerStore, company_id: Uuid, skip: &[&str]) {
    for (code, name, account_type) in STANDARD_CHART {
        if !skip.contains(code) {
            seed_account(store, company_id, code, name, *account_type).await;
        }
    }
}

pub async fn seed_standard_chart(store: &dyn LedgerStore, company_id: Uuid) {
    seed_chart_except(store, company_id, &[]).await;
}

pub async fn account_id(store: &dyn LedgerStore, company_id: Uuid, code: &str) -> Uuid {
    store
        .find_account_by_code(company_id, code)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("account {} not seeded", code))
        .id
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn event(company_id: Uuid, event_type: &str, amount: i64, reference_id: &str) -> LedgerEventV1 {
    LedgerEventV1 {
        event_type: event_type.to_string(),
        company_id,
        amount: Decimal::from(amount),
        date: date(2026, 3, 14),
        description: format!("{} {}", event_type, reference_id),
        source_reference: SourceReference::new(
            event_type.split('.').next().unwrap_or("event"),
            reference_id,
        ),
        target_bank_account_id: None,
        created_by: None,
    }
}

pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Log output written by the subscriber installed with [`capture_logs`]
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's tracing output into a buffer until the guard drops
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
