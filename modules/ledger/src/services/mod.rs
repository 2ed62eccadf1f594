pub mod account_registry;
pub mod balance_service;
pub mod event_resolver;
pub mod general_ledger_service;
pub mod posting_engine;
pub mod retry;
pub mod trial_balance_service;

use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::LedgerLine;
use crate::store::StoreError;

/// Errors shared by the read-side (reporting) services
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid date range: from {from} is after to {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("Account not found: company_id={company_id}, code={code}")]
    AccountNotFound { company_id: Uuid, code: String },

    #[error("Report totals exceed the representable range")]
    AmountOverflow,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub(crate) fn checked_sum(total: i64, amount: i64) -> Result<i64, ReportError> {
    total.checked_add(amount).ok_or(ReportError::AmountOverflow)
}

/// (debit, credit) sums per account
pub(crate) fn sum_by_account(
    lines: &[LedgerLine],
) -> Result<HashMap<Uuid, (i64, i64)>, ReportError> {
    let mut sums: HashMap<Uuid, (i64, i64)> = HashMap::new();
    for line in lines {
        let sum = sums.entry(line.account_id).or_insert((0, 0));
        sum.0 = checked_sum(sum.0, line.debit_minor)?;
        sum.1 = checked_sum(sum.1, line.credit_minor)?;
    }
    Ok(sums)
}

pub(crate) fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ReportError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ReportError::InvalidDateRange { from, to }),
        _ => Ok(()),
    }
}
