//! Cached balance rebuild
//!
//! Posting never touches `accounts.balance_minor`. This recomputes it from
//! posted lines (reversed entries excluded) and writes it back.

use serde::Serialize;
use uuid::Uuid;

use crate::models::LineQuery;
use crate::services::{sum_by_account, ReportError};
use crate::store::LedgerStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuiltBalance {
    pub account_id: Uuid,
    pub account_code: String,
    pub previous_balance_minor: i64,
    pub balance_minor: i64,
}

/// Recompute every account's cached balance for a company
///
/// Accounts without posted lines are reset to 0.
pub async fn rebuild_cached_balances(
    store: &dyn LedgerStore,
    company_id: Uuid,
) -> Result<Vec<RebuiltBalance>, ReportError> {
    let accounts = store.list_accounts(company_id).await?;
    let lines = store.query_lines(company_id, &LineQuery::default()).await?;

    let sums = sum_by_account(&lines)?;

    let rebuilt: Vec<RebuiltBalance> = accounts
        .into_iter()
        .map(|account| {
            let (debit, credit) = sums.get(&account.id).copied().unwrap_or((0, 0));
            RebuiltBalance {
                account_id: account.id,
                balance_minor: account.normal_balance().net(debit, credit),
                previous_balance_minor: account.balance_minor,
                account_code: account.code,
            }
        })
        .collect();

    let updates: Vec<(Uuid, i64)> = rebuilt
        .iter()
        .map(|b| (b.account_id, b.balance_minor))
        .collect();
    store.set_cached_balances(company_id, &updates).await?;

    let changed = rebuilt
        .iter()
        .filter(|b| b.balance_minor != b.previous_balance_minor)
        .count();
    tracing::info!(
        company_id = %company_id,
        accounts = rebuilt.len(),
        changed = changed,
        "Cached balances rebuilt"
    );

    Ok(rebuilt)
}
