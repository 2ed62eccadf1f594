//! # LedgerStore Abstraction
//!
//! Persistence seam for the posting engine and the ledger read side.
//!
//! ## Implementations
//!
//! - **PostgresLedgerStore**: Production implementation backed by sqlx/Postgres
//! - **InMemoryLedgerStore**: Test/dev implementation with fault injection
//!
//! ## Contract
//!
//! [`LedgerStore::commit_entry`] is the unit of work for posting. Inside one
//! all-or-nothing boundary it must:
//! 1. Return [`CommitOutcome::Duplicate`] if a posted entry already carries
//!    the draft's source reference
//! 2. Check that every line's account exists and is still active
//! 3. Allocate the next `JE-NNNNNN` number for the company under a
//!    per-company lock
//! 4. Write the header (status `posted`) and every line
//!
//! If any step fails nothing is observable afterwards.

mod inmemory_store;
mod postgres_store;

pub use inmemory_store::InMemoryLedgerStore;
pub use postgres_store::PostgresLedgerStore;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{
    Account, AccountStatus, EntryStatus, JournalEntry, JournalEntryWithLines, LedgerLine,
    LineQuery, NewAccount, NewJournalEntry, SourceReference,
};

/// Errors that can occur in a ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Account code '{code}' already exists for company {company_id}")]
    DuplicateAccountCode { company_id: Uuid, code: String },

    #[error("Parent account {0} does not exist for this company")]
    InvalidParent(Uuid),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Account {code} ({account_id}) is inactive and cannot receive postings")]
    AccountInactive { account_id: Uuid, code: String },

    #[error("Account {0} is referenced by journal lines and cannot be deleted")]
    AccountInUse(Uuid),

    #[error("Journal entry not found: {0}")]
    EntryNotFound(Uuid),

    #[error("Journal entry {entry_id} cannot move from {from} to {to}")]
    InvalidTransition {
        entry_id: Uuid,
        from: EntryStatus,
        to: EntryStatus,
    },

    #[error("Entry number collision for company {0}")]
    SequenceConflict(Uuid),

    #[error("Source reference {reference_type}/{reference_id} was posted concurrently")]
    ReferenceConflict {
        reference_type: String,
        reference_id: String,
    },

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Conflicts caused by a concurrent posting; the whole unit of work can
    /// be retried.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            StoreError::SequenceConflict(_) | StoreError::ReferenceConflict { .. }
        )
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of committing a draft entry
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Entry and lines were written
    Committed(JournalEntryWithLines),
    /// A posted entry already exists for the draft's source reference
    Duplicate {
        existing_entry_id: Uuid,
        entry_number: String,
    },
}

/// Storage operations required by the ledger
///
/// Every operation is scoped by `company_id`; no implementation may return
/// or modify rows belonging to another company.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a Chart of Accounts entry. Codes are unique per company and
    /// the parent must belong to the same company.
    async fn create_account(&self, account: NewAccount) -> StoreResult<Account>;

    async fn find_account(&self, company_id: Uuid, account_id: Uuid)
        -> StoreResult<Option<Account>>;

    async fn find_account_by_code(
        &self,
        company_id: Uuid,
        code: &str,
    ) -> StoreResult<Option<Account>>;

    /// All accounts of a company, ordered by code
    async fn list_accounts(&self, company_id: Uuid) -> StoreResult<Vec<Account>>;

    async fn set_account_status(
        &self,
        company_id: Uuid,
        account_id: Uuid,
        status: AccountStatus,
    ) -> StoreResult<Account>;

    /// Hard-delete an account that no journal line references
    async fn delete_account(&self, company_id: Uuid, account_id: Uuid) -> StoreResult<()>;

    /// Overwrite cached balances; accounts not listed are left untouched
    async fn set_cached_balances(
        &self,
        company_id: Uuid,
        balances: &[(Uuid, i64)],
    ) -> StoreResult<()>;

    /// Atomically number and persist a draft entry (see module docs)
    async fn commit_entry(&self, entry: NewJournalEntry) -> StoreResult<CommitOutcome>;

    async fn find_entry(
        &self,
        company_id: Uuid,
        entry_id: Uuid,
    ) -> StoreResult<Option<JournalEntryWithLines>>;

    async fn find_posted_by_reference(
        &self,
        company_id: Uuid,
        reference: &SourceReference,
    ) -> StoreResult<Option<JournalEntry>>;

    /// Flip a posted entry to reversed. Any other current status yields
    /// [`StoreError::InvalidTransition`].
    async fn mark_reversed(&self, company_id: Uuid, entry_id: Uuid) -> StoreResult<JournalEntry>;

    /// Every entry of a company in any status, ordered by entry number
    async fn list_entries(&self, company_id: Uuid) -> StoreResult<Vec<JournalEntryWithLines>>;

    /// Lines joined with their headers, ordered by entry date, entry number
    /// and line number. Draft entries are never returned; reversed entries
    /// only when `query.include_reversed` is set.
    async fn query_lines(&self, company_id: Uuid, query: &LineQuery)
        -> StoreResult<Vec<LedgerLine>>;
}

impl fmt::Debug for dyn LedgerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerStore")
    }
}
