//! General Ledger Service
//!
//! Per-account ledger with opening balance, running balance and closing
//! balance, all on the account's normal side.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{EntryStatus, LineQuery};
use crate::services::{check_range, checked_sum, ReportError};
use crate::store::LedgerStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralLedgerResponse {
    pub company_id: Uuid,
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub normal_balance: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Net of posted lines dated before `from` (0 without `from`)
    pub opening_balance_minor: i64,
    pub rows: Vec<GeneralLedgerRow>,
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
    pub closing_balance_minor: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralLedgerRow {
    pub entry_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub entry_status: EntryStatus,
    pub description: String,
    pub line_number: i32,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub running_balance_minor: i64,
    /// False for reversed entries listed for audit; they do not move the
    /// running balance
    pub counted: bool,
}

/// Get the general ledger for one account
pub async fn get_general_ledger(
    store: &dyn LedgerStore,
    company_id: Uuid,
    account_code: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    include_reversed: bool,
) -> Result<GeneralLedgerResponse, ReportError> {
    check_range(from, to)?;

    let account = store
        .find_account_by_code(company_id, account_code)
        .await?
        .ok_or_else(|| ReportError::AccountNotFound {
            company_id,
            code: account_code.to_string(),
        })?;
    let normal_balance = account.normal_balance();

    let opening_balance_minor = match from.and_then(|d| d.pred_opt()) {
        Some(day_before) => store
            .query_lines(
                company_id,
                &LineQuery {
                    account_id: Some(account.id),
                    from: None,
                    to: Some(day_before),
                    include_reversed: false,
                },
            )
            .await?
            .iter()
            .try_fold(0i64, |acc, l| {
                checked_sum(acc, normal_balance.net(l.debit_minor, l.credit_minor))
            })?,
        None => 0,
    };

    let lines = store
        .query_lines(
            company_id,
            &LineQuery {
                account_id: Some(account.id),
                from,
                to,
                include_reversed,
            },
        )
        .await?;

    let mut running = opening_balance_minor;
    let mut total_debit_minor = 0;
    let mut total_credit_minor = 0;
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let counted = line.entry_status == EntryStatus::Posted;
        if counted {
            running = checked_sum(running, normal_balance.net(line.debit_minor, line.credit_minor))?;
            total_debit_minor = checked_sum(total_debit_minor, line.debit_minor)?;
            total_credit_minor = checked_sum(total_credit_minor, line.credit_minor)?;
        }
        rows.push(GeneralLedgerRow {
            entry_id: line.entry_id,
            entry_number: line.entry_number,
            entry_date: line.entry_date,
            entry_status: line.entry_status,
            description: line.line_description.unwrap_or(line.entry_description),
            line_number: line.line_number,
            debit_minor: line.debit_minor,
            credit_minor: line.credit_minor,
            running_balance_minor: running,
            counted,
        });
    }

    Ok(GeneralLedgerResponse {
        company_id,
        account_id: account.id,
        account_code: account.code,
        account_name: account.name,
        normal_balance: normal_balance.as_str().to_string(),
        from,
        to,
        opening_balance_minor,
        rows,
        total_debit_minor,
        total_credit_minor,
        closing_balance_minor: running,
    })
}
