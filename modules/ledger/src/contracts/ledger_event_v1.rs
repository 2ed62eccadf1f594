//! Ledger Event V1 Contract Types
//!
//! A business workflow sends one of these when an Expense, Asset Purchase or
//! Cash Transaction reaches its approved/completed state.
//!
//! Field names are part of the wire contract; `amount` travels as a decimal
//! string (`"500000.00"`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::SourceReference;

pub const EXPENSE_APPROVED: &str = "expense.approved";
pub const ASSET_PURCHASE_APPROVED: &str = "asset_purchase.approved";
pub const CASH_DEPOSIT: &str = "cash_transaction.deposit";
pub const CASH_WITHDRAWAL: &str = "cash_transaction.withdrawal";
pub const CASH_TRANSFER: &str = "cash_transaction.transfer";
pub const CASH_EXPENSE: &str = "cash_transaction.expense";

/// Payload for a ledger posting trigger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEventV1 {
    /// Event type, e.g. `expense.approved` or `cash_transaction.deposit`
    pub event_type: String,

    /// Company that owns the business object (and the ledger)
    pub company_id: Uuid,

    /// Posting amount, at most 2 decimal places
    pub amount: Decimal,

    /// Accounting date for the journal entry
    pub date: NaiveDate,

    /// Free text seeding the entry description (1-500 chars)
    pub description: String,

    /// Originating business object; the idempotency key for posting
    pub source_reference: SourceReference,

    /// Destination bank account for transfers; decides transfer direction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bank_account_id: Option<String>,

    /// User who approved/completed the business object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
}
