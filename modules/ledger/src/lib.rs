pub mod config;
pub mod contracts;
pub mod db;
pub mod metrics;
pub mod models;
pub mod repos;
pub mod routes;
pub mod services;
pub mod store;
pub mod validation;

pub use routes::{router, AppState};
pub use services::posting_engine::{PostingEngine, PostingError, PostingOutcome};
pub use store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};
