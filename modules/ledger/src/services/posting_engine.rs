//! Posting engine
//!
//! Turns ledger events and manual requests into balanced, numbered,
//! posted journal entries, and reverses posted entries.
//!
//! `post_event`:
//! 1. Resolves the event against the rules table (unknown types are skipped)
//! 2. Short-circuits if the source reference is already posted
//! 3. Resolves the debit and credit accounts (nothing is written on failure)
//! 4. Builds a draft with lines numbered from 1 and checks the journal
//!    invariants
//! 5. Commits through the store, retrying number/reference races with
//!    backoff

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::{LedgerEventV1, ManualEntryRequestV1};
use crate::metrics::Metrics;
use crate::models::{
    Account, EntryStatus, JournalEntry, JournalEntryWithLines, NewJournalEntry, NewJournalLine,
};
use crate::services::account_registry::{AccountError, AccountRegistry};
use crate::services::event_resolver::{self, AccountRole, Resolution, WellKnownAccounts};
use crate::services::retry::{retry_with_backoff, RetryConfig};
use crate::store::{CommitOutcome, LedgerStore, StoreError};
use crate::validation::{validate_draft, validate_manual_entry, ValidationError};

/// Errors that can occur while posting or reversing
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    #[error("Account not configured: company_id={company_id}, code={code}")]
    AccountNotConfigured { company_id: Uuid, code: String },

    #[error("Account is inactive: company_id={company_id}, code={code}")]
    AccountInactive { company_id: Uuid, code: String },

    #[error("Unbalanced entry: debits {total_debit_minor} != credits {total_credit_minor}")]
    UnbalancedEntryAttempt {
        total_debit_minor: i64,
        total_credit_minor: i64,
    },

    /// Malformed event or manual entry request
    #[error("Invalid posting request: {0}")]
    InvalidEvent(ValidationError),

    #[error("Journal entry not found: {0}")]
    EntryNotFound(Uuid),

    #[error("Journal entry {entry_id} is {from} and cannot be reversed")]
    InvalidTransition { entry_id: Uuid, from: EntryStatus },

    #[error("Account registry error: {0}")]
    Registry(AccountError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationError> for PostingError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnbalancedEntry {
                total_debit_minor,
                total_credit_minor,
            } => PostingError::UnbalancedEntryAttempt {
                total_debit_minor,
                total_credit_minor,
            },
            other => PostingError::InvalidEvent(other),
        }
    }
}

impl From<AccountError> for PostingError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotConfigured { company_id, code } => {
                PostingError::AccountNotConfigured { company_id, code }
            }
            AccountError::Inactive { company_id, code } => {
                PostingError::AccountInactive { company_id, code }
            }
            AccountError::Store(e) => PostingError::Store(e),
            other => PostingError::Registry(other),
        }
    }
}

pub type PostingResult<T> = Result<T, PostingError>;

/// Result of a posting call that did not fail
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PostingOutcome {
    Posted {
        entry: JournalEntryWithLines,
    },
    /// The source reference already has a posted entry; nothing was written
    Duplicate {
        existing_entry_id: Uuid,
        entry_number: String,
    },
    /// No posting rule exists for the event type; nothing was written
    Skipped {
        event_type: String,
    },
}

impl PostingOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PostingOutcome::Posted { .. } => "posted",
            PostingOutcome::Duplicate { .. } => "duplicate",
            PostingOutcome::Skipped { .. } => "skipped",
        }
    }
}

pub struct PostingEngine {
    store: Arc<dyn LedgerStore>,
    registry: AccountRegistry,
    well_known: WellKnownAccounts,
    retry: RetryConfig,
    metrics: Option<Metrics>,
}

impl PostingEngine {
    pub fn new(store: Arc<dyn LedgerStore>, well_known: WellKnownAccounts) -> Self {
        Self {
            registry: AccountRegistry::new(store.clone()),
            store,
            well_known,
            retry: RetryConfig::default(),
            metrics: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Post a ledger event
    pub async fn post_event(&self, event: &LedgerEventV1) -> PostingResult<PostingOutcome> {
        let result = self.post_event_inner(event).await;
        if let Err(e) = &result {
            let reference = &event.source_reference;
            match e {
                // Chart misconfiguration needs an operator, not a retry
                PostingError::AccountNotConfigured { .. } | PostingError::AccountInactive { .. } => {
                    tracing::error!(
                        company_id = %event.company_id,
                        event_type = %event.event_type,
                        reference_type = %reference.reference_type,
                        reference_id = %reference.reference_id,
                        error = %e,
                        "Ledger event could not be posted"
                    )
                }
                _ => tracing::warn!(
                    company_id = %event.company_id,
                    event_type = %event.event_type,
                    reference_type = %reference.reference_type,
                    reference_id = %reference.reference_id,
                    error = %e,
                    "Ledger event rejected"
                ),
            }
        }
        self.record(&result);
        result
    }

    async fn post_event_inner(&self, event: &LedgerEventV1) -> PostingResult<PostingOutcome> {
        let proposal = match event_resolver::resolve(event)? {
            Resolution::Post(proposal) => proposal,
            Resolution::Unsupported => {
                tracing::info!(
                    company_id = %event.company_id,
                    event_type = %event.event_type,
                    "No posting rule for event type, skipping"
                );
                return Ok(PostingOutcome::Skipped {
                    event_type: event.event_type.clone(),
                });
            }
        };

        if let Some(existing) = self
            .store
            .find_posted_by_reference(proposal.company_id, &proposal.source_reference)
            .await?
        {
            return Ok(self.duplicate(proposal.company_id, existing));
        }

        let debit = self
            .resolve_role(proposal.company_id, proposal.debit_roles)
            .await?;
        let credit = self
            .resolve_role(proposal.company_id, proposal.credit_roles)
            .await?;

        let draft = NewJournalEntry {
            company_id: proposal.company_id,
            entry_date: proposal.entry_date,
            description: proposal.description,
            created_by: proposal.created_by,
            source_reference: Some(proposal.source_reference),
            lines: vec![
                NewJournalLine {
                    line_number: 1,
                    account_id: debit.id,
                    debit_minor: proposal.amount_minor,
                    credit_minor: 0,
                    description: None,
                },
                NewJournalLine {
                    line_number: 2,
                    account_id: credit.id,
                    debit_minor: 0,
                    credit_minor: proposal.amount_minor,
                    description: None,
                },
            ],
        };

        self.commit(draft, Some(&event.event_type)).await
    }

    /// Post a compound entry whose lines name accounts by code
    pub async fn post_manual_entry(
        &self,
        request: &ManualEntryRequestV1,
    ) -> PostingResult<PostingOutcome> {
        let result = self.post_manual_entry_inner(request).await;
        if let Err(e) = &result {
            tracing::warn!(
                company_id = %request.company_id,
                error = %e,
                "Manual journal entry rejected"
            );
        }
        self.record(&result);
        result
    }

    async fn post_manual_entry_inner(
        &self,
        request: &ManualEntryRequestV1,
    ) -> PostingResult<PostingOutcome> {
        let amounts = validate_manual_entry(request)?;

        if let Some(reference) = &request.source_reference {
            if let Some(existing) = self
                .store
                .find_posted_by_reference(request.company_id, reference)
                .await?
            {
                return Ok(self.duplicate(request.company_id, existing));
            }
        }

        let mut lines = Vec::with_capacity(request.lines.len());
        for (idx, (line, (debit_minor, credit_minor))) in
            request.lines.iter().zip(amounts).enumerate()
        {
            let account = self
                .registry
                .resolve_by_code(request.company_id, line.account_code.trim())
                .await?;
            lines.push(NewJournalLine {
                line_number: idx as i32 + 1,
                account_id: account.id,
                debit_minor,
                credit_minor,
                description: line.description.clone(),
            });
        }

        let draft = NewJournalEntry {
            company_id: request.company_id,
            entry_date: request.entry_date,
            description: request.description.clone(),
            created_by: request.created_by,
            source_reference: request.source_reference.clone(),
            lines,
        };

        self.commit(draft, None).await
    }

    /// Flip a posted entry to reversed
    ///
    /// Only `posted` entries can be reversed; reversed is terminal. No
    /// compensating entry is written.
    pub async fn reverse_entry(&self, company_id: Uuid, entry_id: Uuid) -> PostingResult<JournalEntry> {
        let result = self
            .store
            .mark_reversed(company_id, entry_id)
            .await
            .map_err(|e| match e {
                StoreError::EntryNotFound(id) => PostingError::EntryNotFound(id),
                StoreError::InvalidTransition { entry_id, from, .. } => {
                    PostingError::InvalidTransition { entry_id, from }
                }
                other => PostingError::Store(other),
            });

        match &result {
            Ok(entry) => {
                tracing::info!(
                    company_id = %company_id,
                    entry_id = %entry_id,
                    entry_number = %entry.entry_number,
                    "Journal entry reversed"
                );
                self.record_reversal("success");
            }
            Err(e) => {
                tracing::warn!(
                    company_id = %company_id,
                    entry_id = %entry_id,
                    error = %e,
                    "Journal entry reversal rejected"
                );
                self.record_reversal("failure");
            }
        }

        result
    }

    /// First configured, active account among the candidate roles. When
    /// none qualifies, the error for the first candidate is returned.
    async fn resolve_role(&self, company_id: Uuid, roles: &[AccountRole]) -> PostingResult<Account> {
        let mut first_error = None;

        for role in roles {
            let code = self.well_known.code_for(*role);
            match self.registry.resolve_by_code(company_id, code).await {
                Ok(account) => return Ok(account),
                Err(e @ (AccountError::NotConfigured { .. } | AccountError::Inactive { .. })) => {
                    tracing::debug!(
                        company_id = %company_id,
                        role = ?role,
                        code = %code,
                        "Candidate account unavailable"
                    );
                    first_error.get_or_insert(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(first_error
            .map(PostingError::from)
            .unwrap_or_else(|| {
                PostingError::Registry(AccountError::InvalidAccount(
                    "posting rule lists no candidate accounts".to_string(),
                ))
            }))
    }

    async fn commit(
        &self,
        draft: NewJournalEntry,
        event_type: Option<&str>,
    ) -> PostingResult<PostingOutcome> {
        validate_draft(&draft)?;

        let company_id = draft.company_id;
        let outcome = retry_with_backoff(
            || self.store.commit_entry(draft.clone()),
            StoreError::is_retriable,
            &self.retry,
            "commit_entry",
        )
        .await
        .map_err(|e| match e {
            // Deactivated after the registry lookup
            StoreError::AccountInactive { code, .. } => {
                PostingError::AccountInactive { company_id, code }
            }
            other => PostingError::Store(other),
        })?;

        match outcome {
            CommitOutcome::Committed(entry) => {
                tracing::info!(
                    company_id = %company_id,
                    entry_id = %entry.header.id,
                    entry_number = %entry.header.entry_number,
                    event_type = event_type.unwrap_or("manual"),
                    total_minor = entry.header.total_debit_minor,
                    "Journal entry posted"
                );
                Ok(PostingOutcome::Posted { entry })
            }
            CommitOutcome::Duplicate {
                existing_entry_id,
                entry_number,
            } => {
                tracing::info!(
                    company_id = %company_id,
                    existing_entry_id = %existing_entry_id,
                    entry_number = %entry_number,
                    "Source reference already posted, skipping (idempotency)"
                );
                Ok(PostingOutcome::Duplicate {
                    existing_entry_id,
                    entry_number,
                })
            }
        }
    }

    fn duplicate(&self, company_id: Uuid, existing: JournalEntry) -> PostingOutcome {
        tracing::info!(
            company_id = %company_id,
            existing_entry_id = %existing.id,
            entry_number = %existing.entry_number,
            "Source reference already posted, skipping (idempotency)"
        );
        PostingOutcome::Duplicate {
            existing_entry_id: existing.id,
            entry_number: existing.entry_number,
        }
    }

    fn record(&self, result: &PostingResult<PostingOutcome>) {
        if let Some(metrics) = &self.metrics {
            match result {
                Ok(outcome) => metrics.record_posting(outcome.label()),
                Err(_) => metrics.record_posting("failed"),
            }
        }
    }

    fn record_reversal(&self, result: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_reversal(result);
        }
    }
}
