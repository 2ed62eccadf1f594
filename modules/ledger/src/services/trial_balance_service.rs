//! Trial Balance Service
//!
//! Sums posted journal lines per account for a company and an optional
//! date range. Reversed entries are excluded; the cached account balance is
//! never consulted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::LineQuery;
use crate::services::{check_range, checked_sum, sum_by_account, ReportError};
use crate::store::LedgerStore;

/// Trial balance response with account rows and totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceResponse {
    pub company_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub rows: Vec<TrialBalanceRowDto>,
    pub totals: TrialBalanceTotals,
}

/// Trial balance row DTO (Data Transfer Object)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRowDto {
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub account_type: String,
    pub normal_balance: String,
    pub debit_total_minor: i64,
    pub credit_total_minor: i64,
    /// Net on the account's normal side
    pub net_balance_minor: i64,
}

/// Trial balance totals for verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub total_debits: i64,
    pub total_credits: i64,
    pub is_balanced: bool,
}

/// Get the trial balance for a company
///
/// Only accounts with at least one posted line in range get a row; rows are
/// ordered by account code.
pub async fn get_trial_balance(
    store: &dyn LedgerStore,
    company_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<TrialBalanceResponse, ReportError> {
    check_range(from, to)?;

    let lines = store
        .query_lines(
            company_id,
            &LineQuery {
                account_id: None,
                from,
                to,
                include_reversed: false,
            },
        )
        .await?;

    let sums = sum_by_account(&lines)?;

    let rows: Vec<TrialBalanceRowDto> = store
        .list_accounts(company_id)
        .await?
        .into_iter()
        .filter_map(|account| {
            let (debit_total_minor, credit_total_minor) = sums.get(&account.id).copied()?;
            let normal_balance = account.normal_balance();
            Some(TrialBalanceRowDto {
                account_id: account.id,
                account_code: account.code,
                account_name: account.name,
                account_type: account.account_type.as_str().to_string(),
                normal_balance: normal_balance.as_str().to_string(),
                debit_total_minor,
                credit_total_minor,
                net_balance_minor: normal_balance.net(debit_total_minor, credit_total_minor),
            })
        })
        .collect();

    let totals = calculate_totals(&rows)?;

    tracing::debug!(
        company_id = %company_id,
        rows = rows.len(),
        is_balanced = totals.is_balanced,
        "Trial balance computed"
    );

    Ok(TrialBalanceResponse {
        company_id,
        from,
        to,
        rows,
        totals,
    })
}

/// Sums all debit and credit totals and checks if they balance
fn calculate_totals(rows: &[TrialBalanceRowDto]) -> Result<TrialBalanceTotals, ReportError> {
    let mut total_debits = 0i64;
    let mut total_credits = 0i64;
    for row in rows {
        total_debits = checked_sum(total_debits, row.debit_total_minor)?;
        total_credits = checked_sum(total_credits, row.credit_total_minor)?;
    }

    Ok(TrialBalanceTotals {
        total_debits,
        total_credits,
        is_balanced: total_debits == total_credits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(debit: i64, credit: i64) -> TrialBalanceRowDto {
        TrialBalanceRowDto {
            account_id: Uuid::new_v4(),
            account_code: "1000".to_string(),
            account_name: "Cash".to_string(),
            account_type: "asset".to_string(),
            normal_balance: "debit".to_string(),
            debit_total_minor: debit,
            credit_total_minor: credit,
            net_balance_minor: debit - credit,
        }
    }

    #[test]
    fn test_calculate_totals_balanced() {
        let totals = calculate_totals(&[row(10000, 0), row(0, 10000)]).unwrap();
        assert_eq!(totals.total_debits, 10000);
        assert_eq!(totals.total_credits, 10000);
        assert!(totals.is_balanced);
    }

    #[test]
    fn test_calculate_totals_unbalanced() {
        let totals = calculate_totals(&[row(10000, 0), row(0, 5000)]).unwrap();
        assert!(!totals.is_balanced);
    }

    #[test]
    fn test_calculate_totals_empty() {
        let totals = calculate_totals(&[]).unwrap();
        assert_eq!(totals.total_debits, 0);
        assert!(totals.is_balanced);
    }

    #[test]
    fn test_calculate_totals_overflow() {
        let result = calculate_totals(&[row(i64::MAX, 0), row(1, 0)]);
        assert!(matches!(result, Err(ReportError::AmountOverflow)));
    }
}
