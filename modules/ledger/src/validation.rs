//! Validation logic for ledger requests and journal entry drafts
//!
//! Inbound payloads (events, manual entries) are checked for shape, and every
//! draft is checked against the journal invariants before anything is written:
//! each line is a debit xor a credit, line numbers run 1..N without gaps, and
//! total debits equal total credits exactly.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::contracts::{LedgerEventV1, ManualEntryRequestV1};
use crate::models::{decimal_to_minor, NewJournalEntry, MAX_ENTRY_TOTAL_MINOR};

const MAX_TEXT_LEN: usize = 500;

/// Validation errors for ledger requests
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Amount must be positive with at most 2 decimal places, got {0}")]
    InvalidAmount(Decimal),

    #[error("Description must be between 1 and 500 characters, got {0} characters")]
    InvalidDescriptionLength(usize),

    #[error("Source reference type and id must be non-empty")]
    InvalidSourceReference,

    #[error("Lines must have at least 2 items, got {0}")]
    InsufficientLines(usize),

    #[error("Line {0}: account_code cannot be empty")]
    EmptyAccountCode(usize),

    #[error("Line {0}: debit must be non-negative, got {1}")]
    NegativeDebit(usize, Decimal),

    #[error("Line {0}: credit must be non-negative, got {1}")]
    NegativeCredit(usize, Decimal),

    #[error("Amount exceeds the per-entry maximum of {} minor units", MAX_ENTRY_TOTAL_MINOR)]
    AmountOutOfRange,

    #[error("Line {0}: amount has more than 2 decimal places")]
    InvalidLineAmount(usize),

    #[error("Line {0}: exactly one of debit or credit must be non-zero")]
    NotSingleSided(usize),

    #[error("Line {0}: description exceeds 500 characters, got {1}")]
    LineDescriptionTooLong(usize, usize),

    #[error("Line numbers must be dense from 1: expected {expected}, got {found}")]
    NonContiguousLineNumbers { expected: i32, found: i32 },

    #[error("Total debits ({total_debit_minor}) must equal total credits ({total_credit_minor})")]
    UnbalancedEntry {
        total_debit_minor: i64,
        total_credit_minor: i64,
    },
}

/// Validate a ledger event and return its amount in minor units
pub fn validate_ledger_event(event: &LedgerEventV1) -> Result<i64, ValidationError> {
    validate_description(&event.description)?;

    if event.source_reference.reference_type.trim().is_empty()
        || event.source_reference.reference_id.trim().is_empty()
    {
        return Err(ValidationError::InvalidSourceReference);
    }

    match decimal_to_minor(event.amount) {
        Some(minor) if minor > MAX_ENTRY_TOTAL_MINOR => Err(ValidationError::AmountOutOfRange),
        Some(minor) if minor > 0 => Ok(minor),
        _ => Err(ValidationError::InvalidAmount(event.amount)),
    }
}

/// Validate a manual entry request
///
/// Returns the `(debit_minor, credit_minor)` pair of each line, in order.
pub fn validate_manual_entry(
    request: &ManualEntryRequestV1,
) -> Result<Vec<(i64, i64)>, ValidationError> {
    validate_description(&request.description)?;

    if let Some(reference) = &request.source_reference {
        if reference.reference_type.trim().is_empty() || reference.reference_id.trim().is_empty() {
            return Err(ValidationError::InvalidSourceReference);
        }
    }

    if request.lines.len() < 2 {
        return Err(ValidationError::InsufficientLines(request.lines.len()));
    }

    let mut amounts = Vec::with_capacity(request.lines.len());
    let mut total_debit_minor = 0i64;
    let mut total_credit_minor = 0i64;

    for (idx, line) in request.lines.iter().enumerate() {
        if line.account_code.trim().is_empty() {
            return Err(ValidationError::EmptyAccountCode(idx));
        }
        if line.debit < Decimal::ZERO {
            return Err(ValidationError::NegativeDebit(idx, line.debit));
        }
        if line.credit < Decimal::ZERO {
            return Err(ValidationError::NegativeCredit(idx, line.credit));
        }
        if let Some(ref description) = line.description {
            let len = description.chars().count();
            if len > MAX_TEXT_LEN {
                return Err(ValidationError::LineDescriptionTooLong(idx, len));
            }
        }

        let debit = decimal_to_minor(line.debit).ok_or(ValidationError::InvalidLineAmount(idx))?;
        let credit =
            decimal_to_minor(line.credit).ok_or(ValidationError::InvalidLineAmount(idx))?;
        if (debit == 0) == (credit == 0) {
            return Err(ValidationError::NotSingleSided(idx));
        }

        total_debit_minor = add_within_cap(total_debit_minor, debit)?;
        total_credit_minor = add_within_cap(total_credit_minor, credit)?;
        amounts.push((debit, credit));
    }

    if total_debit_minor != total_credit_minor {
        return Err(ValidationError::UnbalancedEntry {
            total_debit_minor,
            total_credit_minor,
        });
    }

    Ok(amounts)
}

/// Check a draft against the journal entry invariants
///
/// This is the last gate before the store is touched; a draft that fails
/// here is never persisted.
pub fn validate_draft(draft: &NewJournalEntry) -> Result<(), ValidationError> {
    validate_description(&draft.description)?;

    if draft.lines.len() < 2 {
        return Err(ValidationError::InsufficientLines(draft.lines.len()));
    }

    for (idx, line) in draft.lines.iter().enumerate() {
        let expected = idx as i32 + 1;
        if line.line_number != expected {
            return Err(ValidationError::NonContiguousLineNumbers {
                expected,
                found: line.line_number,
            });
        }
        if line.debit_minor < 0 {
            return Err(ValidationError::NegativeDebit(idx, Decimal::new(line.debit_minor, 2)));
        }
        if line.credit_minor < 0 {
            return Err(ValidationError::NegativeCredit(idx, Decimal::new(line.credit_minor, 2)));
        }
        if (line.debit_minor == 0) == (line.credit_minor == 0) {
            return Err(ValidationError::NotSingleSided(idx));
        }
    }

    let mut total_debit_minor = 0i64;
    let mut total_credit_minor = 0i64;
    for line in &draft.lines {
        total_debit_minor = add_within_cap(total_debit_minor, line.debit_minor)?;
        total_credit_minor = add_within_cap(total_credit_minor, line.credit_minor)?;
    }
    if total_debit_minor != total_credit_minor {
        return Err(ValidationError::UnbalancedEntry {
            total_debit_minor,
            total_credit_minor,
        });
    }

    Ok(())
}

/// Running side total; never wraps and never passes the entry cap
fn add_within_cap(total: i64, amount: i64) -> Result<i64, ValidationError> {
    total
        .checked_add(amount)
        .filter(|sum| *sum <= MAX_ENTRY_TOTAL_MINOR)
        .ok_or(ValidationError::AmountOutOfRange)
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    let len = description.chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        return Err(ValidationError::InvalidDescriptionLength(len));
    }
    Ok(())
}
