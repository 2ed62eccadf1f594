//! Postgres implementation of the LedgerStore trait

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CommitOutcome, LedgerStore, StoreError, StoreResult};
use crate::models::{
    format_entry_number, Account, AccountStatus, EntryStatus, JournalEntry, JournalEntryLine,
    JournalEntryWithLines, LedgerLine, LineQuery, NewAccount, NewJournalEntry, SourceReference,
};
use crate::repos::{account_repo, journal_repo, sequence_repo};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const ENTRY_NUMBER_KEY: &str = "journal_entries_company_entry_number_key";
const POSTED_REFERENCE_KEY: &str = "journal_entries_posted_reference_key";
const ACCOUNT_CODE_KEY: &str = "accounts_company_code_key";
const ACCOUNT_PARENT_FKEY: &str = "accounts_parent_id_fkey";

/// LedgerStore backed by Postgres. Each commit runs in one transaction.
#[derive(Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// (sqlstate, constraint) of a database error, if it carries them
fn violation(err: &sqlx::Error) -> Option<(String, Option<String>)> {
    match err {
        sqlx::Error::Database(db_err) => Some((
            db_err.code()?.into_owned(),
            db_err.constraint().map(str::to_string),
        )),
        _ => None,
    }
}

fn is_violation(err: &sqlx::Error, code: &str, constraint: &str) -> bool {
    matches!(violation(err), Some((c, Some(k))) if c == code && k == constraint)
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn create_account(&self, account: NewAccount) -> StoreResult<Account> {
        if let Some(parent_id) = account.parent_id {
            if account_repo::find_by_id(&self.pool, account.company_id, parent_id)
                .await?
                .is_none()
            {
                return Err(StoreError::InvalidParent(parent_id));
            }
        }

        match account_repo::insert(&self.pool, &account).await {
            Ok(created) => Ok(created),
            Err(e) if is_violation(&e, UNIQUE_VIOLATION, ACCOUNT_CODE_KEY) => {
                Err(StoreError::DuplicateAccountCode {
                    company_id: account.company_id,
                    code: account.code,
                })
            }
            Err(e) if is_violation(&e, FOREIGN_KEY_VIOLATION, ACCOUNT_PARENT_FKEY) => Err(
                StoreError::InvalidParent(account.parent_id.unwrap_or_default()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_account(
        &self,
        company_id: Uuid,
        account_id: Uuid,
    ) -> StoreResult<Option<Account>> {
        Ok(account_repo::find_by_id(&self.pool, company_id, account_id).await?)
    }

    async fn find_account_by_code(
        &self,
        company_id: Uuid,
        code: &str,
    ) -> StoreResult<Option<Account>> {
        Ok(account_repo::find_by_code(&self.pool, company_id, code).await?)
    }

    async fn list_accounts(&self, company_id: Uuid) -> StoreResult<Vec<Account>> {
        Ok(account_repo::list(&self.pool, company_id).await?)
    }

    async fn set_account_status(
        &self,
        company_id: Uuid,
        account_id: Uuid,
        status: AccountStatus,
    ) -> StoreResult<Account> {
        account_repo::update_status(&self.pool, company_id, account_id, status)
            .await?
            .ok_or(StoreError::AccountNotFound(account_id))
    }

    async fn delete_account(&self, company_id: Uuid, account_id: Uuid) -> StoreResult<()> {
        match account_repo::delete(&self.pool, company_id, account_id).await {
            Ok(0) => Err(StoreError::AccountNotFound(account_id)),
            Ok(_) => Ok(()),
            Err(e) if matches!(violation(&e), Some((c, _)) if c == FOREIGN_KEY_VIOLATION) => {
                Err(StoreError::AccountInUse(account_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_cached_balances(
        &self,
        company_id: Uuid,
        balances: &[(Uuid, i64)],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        account_repo::update_balances_tx(&mut tx, company_id, balances).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_entry(&self, entry: NewJournalEntry) -> StoreResult<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        if let Some(reference) = &entry.source_reference {
            if let Some(existing) =
                journal_repo::find_posted_by_reference_tx(&mut tx, entry.company_id, reference)
                    .await?
            {
                tx.rollback().await?;
                return Ok(CommitOutcome::Duplicate {
                    existing_entry_id: existing.id,
                    entry_number: existing.entry_number,
                });
            }
        }

        for line in &entry.lines {
            match account_repo::lock_for_posting_tx(&mut tx, entry.company_id, line.account_id)
                .await?
            {
                None => {
                    tx.rollback().await?;
                    return Err(StoreError::AccountNotFound(line.account_id));
                }
                Some((code, status)) if status != AccountStatus::Active => {
                    tx.rollback().await?;
                    return Err(StoreError::AccountInactive {
                        account_id: line.account_id,
                        code,
                    });
                }
                Some(_) => {}
            }
        }

        let sequence = sequence_repo::next_value_tx(&mut tx, entry.company_id).await?;
        let now = Utc::now();
        let header = JournalEntry {
            id: Uuid::new_v4(),
            company_id: entry.company_id,
            entry_number: format_entry_number(sequence),
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
        let lines: Vec<JournalEntryLine> = entry
            .lines
            .into_iter()
            .map(|line| JournalEntryLine {
                id: Uuid::new_v4(),
                journal_entry_id: header.id,
                line_number: line.line_number,
                account_id: line.account_id,
                debit_minor: line.debit_minor,
                credit_minor: line.credit_minor,
                description: line.description,
            })
            .collect();

        // Dropping `tx` on error rolls everything back
        if let Err(e) = journal_repo::insert_entry_tx(&mut tx, &header).await {
            return Err(if is_violation(&e, UNIQUE_VIOLATION, ENTRY_NUMBER_KEY) {
                StoreError::SequenceConflict(header.company_id)
            } else if is_violation(&e, UNIQUE_VIOLATION, POSTED_REFERENCE_KEY) {
                StoreError::ReferenceConflict {
                    reference_type: header.reference_type.unwrap_or_default(),
                    reference_id: header.reference_id.unwrap_or_default(),
                }
            } else {
                e.into()
            });
        }
        journal_repo::insert_lines_tx(&mut tx, &lines).await?;

        tx.commit().await?;

        Ok(CommitOutcome::Committed(JournalEntryWithLines { header, lines }))
    }

    async fn find_entry(
        &self,
        company_id: Uuid,
        entry_id: Uuid,
    ) -> StoreResult<Option<JournalEntryWithLines>> {
        Ok(journal_repo::fetch_entry_with_lines(&self.pool, company_id, entry_id).await?)
    }

    async fn find_posted_by_reference(
        &self,
        company_id: Uuid,
        reference: &SourceReference,
    ) -> StoreResult<Option<JournalEntry>> {
        Ok(journal_repo::find_posted_by_reference(&self.pool, company_id, reference).await?)
    }

    async fn mark_reversed(&self, company_id: Uuid, entry_id: Uuid) -> StoreResult<JournalEntry> {
        if let Some(entry) = journal_repo::mark_reversed(&self.pool, company_id, entry_id).await? {
            return Ok(entry);
        }

        match journal_repo::fetch_header(&self.pool, company_id, entry_id).await? {
            None => Err(StoreError::EntryNotFound(entry_id)),
            Some(entry) => Err(StoreError::InvalidTransition {
                entry_id,
                from: entry.status,
                to: EntryStatus::Reversed,
            }),
        }
    }

    async fn list_entries(&self, company_id: Uuid) -> StoreResult<Vec<JournalEntryWithLines>> {
        Ok(journal_repo::list_with_lines(&self.pool, company_id).await?)
    }

    async fn query_lines(
        &self,
        company_id: Uuid,
        query: &LineQuery,
    ) -> StoreResult<Vec<LedgerLine>> {
        Ok(journal_repo::query_lines(&self.pool, company_id, query).await?)
    }
}
