//! In-memory implementation of the LedgerStore trait for testing and development

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{CommitOutcome, LedgerStore, StoreError, StoreResult};
use crate::models::{
    format_entry_number, parse_entry_sequence, Account, AccountStatus, EntryStatus, JournalEntry,
    JournalEntryLine, JournalEntryWithLines, LedgerLine, LineQuery, NewAccount, NewJournalEntry,
    SourceReference,
};

/// One company's books. Each company has its own lock, so postings for
/// different companies never contend.
#[derive(Debug, Default)]
struct CompanyBook {
    accounts: Vec<Account>,
    entries: Vec<JournalEntry>,
    lines: Vec<JournalEntryLine>,
}

impl CompanyBook {
    /// Highest existing numeric suffix + 1. Only called with the company
    /// lock held.
    fn next_sequence(&self) -> i64 {
        self.entries
            .iter()
            .filter_map(|e| parse_entry_sequence(&e.entry_number))
            .max()
            .unwrap_or(0)
            + 1
    }

    fn lines_of(&self, entry_id: Uuid) -> Vec<JournalEntryLine> {
        let mut lines: Vec<JournalEntryLine> = self
            .lines
            .iter()
            .filter(|l| l.journal_entry_id == entry_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.line_number);
        lines
    }
}

/// LedgerStore implementation holding everything in process memory
///
/// Suitable for:
/// - Unit and integration tests (no external dependencies)
/// - Local development (`STORE_TYPE=inmemory`)
///
/// Writes are staged and applied only after every line has been built, so
/// an injected failure leaves no trace. Two fault hooks exist for tests:
/// [`fail_next_line_write`](Self::fail_next_line_write) and
/// [`inject_sequence_conflicts`](Self::inject_sequence_conflicts).
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    books: Arc<RwLock<HashMap<Uuid, Arc<Mutex<CompanyBook>>>>>,
    fail_line_number: Arc<AtomicI32>,
    pending_sequence_conflicts: Arc<AtomicU32>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail while writing the given line number (1-based)
    pub fn fail_next_line_write(&self, line_number: i32) {
        self.fail_line_number.store(line_number, Ordering::SeqCst);
    }

    /// Make the next `count` commits fail with [`StoreError::SequenceConflict`]
    pub fn inject_sequence_conflicts(&self, count: u32) {
        self.pending_sequence_conflicts.store(count, Ordering::SeqCst);
    }

    async fn book(&self, company_id: Uuid) -> Arc<Mutex<CompanyBook>> {
        if let Some(book) = self.books.read().await.get(&company_id) {
            return book.clone();
        }
        self.books
            .write()
            .await
            .entry(company_id)
            .or_default()
            .clone()
    }

    fn take_sequence_conflict(&self) -> bool {
        self.pending_sequence_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn take_line_failure(&self, line_number: i32) -> bool {
        self.fail_line_number
            .compare_exchange(line_number, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_account(&self, account: NewAccount) -> StoreResult<Account> {
        let book = self.book(account.company_id).await;
        let mut book = book.lock().await;

        if book.accounts.iter().any(|a| a.code == account.code) {
            return Err(StoreError::DuplicateAccountCode {
                company_id: account.company_id,
                code: account.code,
            });
        }
        if let Some(parent_id) = account.parent_id {
            if !book.accounts.iter().any(|a| a.id == parent_id) {
                return Err(StoreError::InvalidParent(parent_id));
            }
        }

        let created = Account {
            id: Uuid::new_v4(),
            company_id: account.company_id,
            code: account.code,
            name: account.name,
            account_type: account.account_type,
            parent_id: account.parent_id,
            balance_minor: 0,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        book.accounts.push(created.clone());
        Ok(created)
    }

    async fn find_account(
        &self,
        company_id: Uuid,
        account_id: Uuid,
    ) -> StoreResult<Option<Account>> {
        let book = self.book(company_id).await;
        let book = book.lock().await;
        Ok(book.accounts.iter().find(|a| a.id == account_id).cloned())
    }

    async fn find_account_by_code(
        &self,
        company_id: Uuid,
        code: &str,
    ) -> StoreResult<Option<Account>> {
        let book = self.book(company_id).await;
        let book = book.lock().await;
        Ok(book.accounts.iter().find(|a| a.code == code).cloned())
    }

    async fn list_accounts(&self, company_id: Uuid) -> StoreResult<Vec<Account>> {
        let book = self.book(company_id).await;
        let book = book.lock().await;
        let mut accounts = book.accounts.clone();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn set_account_status(
        &self,
        company_id: Uuid,
        account_id: Uuid,
        status: AccountStatus,
    ) -> StoreResult<Account> {
        let book = self.book(company_id).await;
        let mut book = book.lock().await;
        let account = book
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(StoreError::AccountNotFound(account_id))?;
        account.status = status;
        Ok(account.clone())
    }

    async fn delete_account(&self, company_id: Uuid, account_id: Uuid) -> StoreResult<()> {
        let book = self.book(company_id).await;
        let mut book = book.lock().await;

        let position = book
            .accounts
            .iter()
            .position(|a| a.id == account_id)
            .ok_or(StoreError::AccountNotFound(account_id))?;
        let referenced = book.lines.iter().any(|l| l.account_id == account_id)
            || book.accounts.iter().any(|a| a.parent_id == Some(account_id));
        if referenced {
            return Err(StoreError::AccountInUse(account_id));
        }

        book.accounts.remove(position);
        Ok(())
    }

    async fn set_cached_balances(
        &self,
        company_id: Uuid,
        balances: &[(Uuid, i64)],
    ) -> StoreResult<()> {
        let book = self.book(company_id).await;
        let mut book = book.lock().await;
        for (account_id, balance_minor) in balances {
            if let Some(account) = book.accounts.iter_mut().find(|a| a.id == *account_id) {
                account.balance_minor = *balance_minor;
            }
        }
        Ok(())
    }

    async fn commit_entry(&self, entry: NewJournalEntry) -> StoreResult<CommitOutcome> {
        let book = self.book(entry.company_id).await;
        let mut book = book.lock().await;

        if let Some(reference) = &entry.source_reference {
            if let Some(existing) = book
                .entries
                .iter()
                .find(|e| e.status == EntryStatus::Posted && e.references(reference))
            {
                return Ok(CommitOutcome::Duplicate {
                    existing_entry_id: existing.id,
                    entry_number: existing.entry_number.clone(),
                });
            }
        }

        for line in &entry.lines {
            match book.accounts.iter().find(|a| a.id == line.account_id) {
                None => return Err(StoreError::AccountNotFound(line.account_id)),
                Some(account) if account.status != AccountStatus::Active => {
                    return Err(StoreError::AccountInactive {
                        account_id: account.id,
                        code: account.code.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if self.take_sequence_conflict() {
            return Err(StoreError::SequenceConflict(entry.company_id));
        }

        let now = Utc::now();
        let header = JournalEntry {
            id: Uuid::new_v4(),
            company_id: entry.company_id,
            entry_number: format_entry_number(book.next_sequence()),
            entry_date: entry.entry_date,
            total_debit_minor: entry.total_debit_minor(),
            total_credit_minor: entry.total_credit_minor(),
            description: entry.description,
            status: EntryStatus::Posted,
            reference_type: entry.source_reference.as_ref().map(|r| r.reference_type.clone()),
            reference_id: entry.source_reference.as_ref().map(|r| r.reference_id.clone()),
            created_by: entry.created_by,
            posted_at: Some(now),
            reversed_at: None,
            created_at: now,
        };

        // Stage every line before touching the book
        let mut staged = Vec::with_capacity(entry.lines.len());
        for line in entry.lines {
            if self.take_line_failure(line.line_number) {
                return Err(StoreError::Write(format!(
                    "injected failure writing line {}",
                    line.line_number
                )));
            }
            staged.push(JournalEntryLine {
                id: Uuid::new_v4(),
                journal_entry_id: header.id,
                line_number: line.line_number,
                account_id: line.account_id,
                debit_minor: line.debit_minor,
                credit_minor: line.credit_minor,
                description: line.description,
            });
        }

        book.entries.push(header.clone());
        book.lines.extend(staged.iter().cloned());

        Ok(CommitOutcome::Committed(JournalEntryWithLines {
            header,
            lines: staged,
        }))
    }

    async fn find_entry(
        &self,
        company_id: Uuid,
        entry_id: Uuid,
    ) -> StoreResult<Option<JournalEntryWithLines>> {
        let book = self.book(company_id).await;
        let book = book.lock().await;
        Ok(book
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .map(|header| JournalEntryWithLines {
                header: header.clone(),
                lines: book.lines_of(header.id),
            }))
    }

    async fn find_posted_by_reference(
        &self,
        company_id: Uuid,
        reference: &SourceReference,
    ) -> StoreResult<Option<JournalEntry>> {
        let book = self.book(company_id).await;
        let book = book.lock().await;
        Ok(book
            .entries
            .iter()
            .find(|e| e.status == EntryStatus::Posted && e.references(reference))
            .cloned())
    }

    async fn mark_reversed(&self, company_id: Uuid, entry_id: Uuid) -> StoreResult<JournalEntry> {
        let book = self.book(company_id).await;
        let mut book = book.lock().await;
        let entry = book
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(StoreError::EntryNotFound(entry_id))?;

        if !entry.status.can_transition_to(EntryStatus::Reversed) {
            return Err(StoreError::InvalidTransition {
                entry_id,
                from: entry.status,
                to: EntryStatus::Reversed,
            });
        }

        entry.status = EntryStatus::Reversed;
        entry.reversed_at = Some(Utc::now());
        Ok(entry.clone())
    }

    async fn list_entries(&self, company_id: Uuid) -> StoreResult<Vec<JournalEntryWithLines>> {
        let book = self.book(company_id).await;
        let book = book.lock().await;
        let mut entries: Vec<JournalEntryWithLines> = book
            .entries
            .iter()
            .map(|header| JournalEntryWithLines {
                header: header.clone(),
                lines: book.lines_of(header.id),
            })
            .collect();
        entries.sort_by_key(|e| parse_entry_sequence(&e.header.entry_number));
        Ok(entries)
    }

    async fn query_lines(
        &self,
        company_id: Uuid,
        query: &LineQuery,
    ) -> StoreResult<Vec<LedgerLine>> {
        let book = self.book(company_id).await;
        let book = book.lock().await;

        let headers: HashMap<Uuid, &JournalEntry> = book
            .entries
            .iter()
            .filter(|e| match e.status {
                EntryStatus::Posted => true,
                EntryStatus::Reversed => query.include_reversed,
                EntryStatus::Draft => false,
            })
            .filter(|e| query.from.map_or(true, |from| e.entry_date >= from))
            .filter(|e| query.to.map_or(true, |to| e.entry_date <= to))
            .map(|e| (e.id, e))
            .collect();

        let mut rows: Vec<LedgerLine> = book
            .lines
            .iter()
            .filter(|l| query.account_id.map_or(true, |id| l.account_id == id))
            .filter_map(|l| {
                headers.get(&l.journal_entry_id).map(|e| LedgerLine {
                    entry_id: e.id,
                    entry_number: e.entry_number.clone(),
                    entry_date: e.entry_date,
                    entry_status: e.status,
                    entry_description: e.description.clone(),
                    line_number: l.line_number,
                    account_id: l.account_id,
                    debit_minor: l.debit_minor,
                    credit_minor: l.credit_minor,
                    line_description: l.description.clone(),
                })
            })
            .collect();

        rows.sort_by_key(|r| {
            (
                r.entry_date,
                parse_entry_sequence(&r.entry_number),
                r.line_number,
            )
        });
        Ok(rows)
    }
}
