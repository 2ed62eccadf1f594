//! Ledger domain types
//!
//! Accounts, journal entries and journal entry lines as stored by every
//! [`LedgerStore`](crate::store::LedgerStore) implementation. Amounts are
//! integer minor units (cents) so balance checks are exact.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix of every journal entry number (`JE-000042`)
pub const ENTRY_NUMBER_PREFIX: &str = "JE-";

/// Account type enum matching database account_type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    /// Side on which the account's balance normally sits
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            AccountType::Asset | AccountType::Expense => NormalBalance::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalBalance::Credit
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }
}

/// Normal balance side, derived from the account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl NormalBalance {
    /// Net movement of a debit/credit pair expressed on this side
    pub fn net(self, debit_minor: i64, credit_minor: i64) -> i64 {
        match self {
            NormalBalance::Debit => debit_minor - credit_minor,
            NormalBalance::Credit => credit_minor - debit_minor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NormalBalance::Debit => "debit",
            NormalBalance::Credit => "credit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

/// Chart of Accounts entry
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<Uuid>,
    /// Cached balance on the normal side. Advisory only; the posted lines
    /// are authoritative.
    pub balance_minor: i64,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn normal_balance(&self) -> NormalBalance {
        self.account_type.normal_balance()
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Account creation request (chart setup)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Journal entry status enum matching database journal_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "journal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Posted,
    Reversed,
}

impl EntryStatus {
    /// draft -> posted -> reversed; reversed is terminal
    pub fn can_transition_to(self, next: EntryStatus) -> bool {
        matches!(
            (self, next),
            (EntryStatus::Draft, EntryStatus::Posted) | (EntryStatus::Posted, EntryStatus::Reversed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Posted => "posted",
            EntryStatus::Reversed => "reversed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed pointer to the business object that triggered a posting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceReference {
    #[serde(rename = "type")]
    pub reference_type: String,
    #[serde(rename = "id")]
    pub reference_id: String,
}

impl SourceReference {
    pub fn new(reference_type: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            reference_type: reference_type.into(),
            reference_id: reference_id.into(),
        }
    }
}

/// Journal entry header
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub company_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub status: EntryStatus,
    pub total_debit_minor: i64,
    pub total_credit_minor: i64,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub created_by: Option<Uuid>,
    pub posted_at: Option<DateTime<Utc>>,
    pub reversed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn source_reference(&self) -> Option<SourceReference> {
        match (&self.reference_type, &self.reference_id) {
            (Some(t), Some(id)) => Some(SourceReference::new(t.clone(), id.clone())),
            _ => None,
        }
    }

    pub fn references(&self, reference: &SourceReference) -> bool {
        self.reference_type.as_deref() == Some(reference.reference_type.as_str())
            && self.reference_id.as_deref() == Some(reference.reference_id.as_str())
    }
}

/// Journal entry line
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct JournalEntryLine {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub line_number: i32,
    pub account_id: Uuid,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub description: Option<String>,
}

/// Entry header together with its ordered lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntryWithLines {
    pub header: JournalEntry,
    pub lines: Vec<JournalEntryLine>,
}

/// A draft entry ready to be committed. Entry number, ids and timestamps
/// are assigned by the store inside the posting transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJournalEntry {
    pub company_id: Uuid,
    pub entry_date: NaiveDate,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub source_reference: Option<SourceReference>,
    pub lines: Vec<NewJournalLine>,
}

impl NewJournalEntry {
    /// Saturates instead of wrapping; validated drafts stay far below
    /// [`MAX_ENTRY_TOTAL_MINOR`].
    pub fn total_debit_minor(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.debit_minor))
    }

    pub fn total_credit_minor(&self) -> i64 {
        self.lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.credit_minor))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewJournalLine {
    pub line_number: i32,
    pub account_id: Uuid,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub description: Option<String>,
}

/// Flattened line + header row used by the ledger read side
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct LedgerLine {
    pub entry_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub entry_status: EntryStatus,
    pub entry_description: String,
    pub line_number: i32,
    pub account_id: Uuid,
    pub debit_minor: i64,
    pub credit_minor: i64,
    pub line_description: Option<String>,
}

/// Filter for [`LedgerStore::query_lines`](crate::store::LedgerStore::query_lines).
/// Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineQuery {
    pub account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_reversed: bool,
}

/// Largest amount, in minor units, that one line or one entry side may carry
/// (10 trillion in major units). Keeps report sums over many entries well
/// inside `i64`.
pub const MAX_ENTRY_TOTAL_MINOR: i64 = 1_000_000_000_000_000;

/// Format a per-company sequence value as an entry number
pub fn format_entry_number(sequence: i64) -> String {
    format!("{}{:06}", ENTRY_NUMBER_PREFIX, sequence)
}

/// Numeric suffix of an entry number, if it has the `JE-` shape
pub fn parse_entry_sequence(entry_number: &str) -> Option<i64> {
    let digits = entry_number.strip_prefix(ENTRY_NUMBER_PREFIX)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Convert a decimal amount to minor units.
///
/// Returns `None` when the amount carries more than 2 decimal places or does
/// not fit in an `i64`.
pub fn decimal_to_minor(amount: Decimal) -> Option<i64> {
    if amount.normalize().scale() > 2 {
        return None;
    }
    amount.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

pub fn minor_to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normal_balance_by_account_type() {
        assert_eq!(AccountType::Asset.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Expense.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Liability.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Equity.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Revenue.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn test_normal_balance_net() {
        assert_eq!(NormalBalance::Debit.net(500, 200), 300);
        assert_eq!(NormalBalance::Credit.net(500, 200), -300);
    }

    #[test]
    fn test_status_transitions() {
        assert!(EntryStatus::Draft.can_transition_to(EntryStatus::Posted));
        assert!(EntryStatus::Posted.can_transition_to(EntryStatus::Reversed));
        assert!(!EntryStatus::Posted.can_transition_to(EntryStatus::Draft));
        assert!(!EntryStatus::Reversed.can_transition_to(EntryStatus::Posted));
        assert!(!EntryStatus::Reversed.can_transition_to(EntryStatus::Draft));
        assert!(!EntryStatus::Draft.can_transition_to(EntryStatus::Reversed));
    }

    #[test]
    fn test_entry_number_format() {
        assert_eq!(format_entry_number(1), "JE-000001");
        assert_eq!(format_entry_number(123456), "JE-123456");
        assert_eq!(parse_entry_sequence("JE-000042"), Some(42));
        assert_eq!(parse_entry_sequence("JE-"), None);
        assert_eq!(parse_entry_sequence("INV-000001"), None);
        assert_eq!(parse_entry_sequence("JE-12a"), None);
    }

    #[test]
    fn test_decimal_to_minor() {
        assert_eq!(decimal_to_minor(Decimal::from(500_000)), Some(50_000_000));
        assert_eq!(decimal_to_minor(Decimal::from_str("12.34").unwrap()), Some(1234));
        assert_eq!(decimal_to_minor(Decimal::from_str("12.340").unwrap()), Some(1234));
        assert_eq!(decimal_to_minor(Decimal::from_str("12.345").unwrap()), None);
        assert_eq!(minor_to_decimal(1234), Decimal::from_str("12.34").unwrap());
    }

    #[test]
    fn test_decimal_to_minor_out_of_range() {
        assert_eq!(decimal_to_minor(Decimal::MAX), None);
        assert_eq!(decimal_to_minor(Decimal::MIN), None);
        // Fits a Decimal after scaling but not an i64
        assert_eq!(decimal_to_minor(Decimal::from(i64::MAX)), None);
    }

    #[test]
    fn test_entry_totals_saturate() {
        let line = |debit_minor, credit_minor| NewJournalLine {
            line_number: 1,
            account_id: Uuid::nil(),
            debit_minor,
            credit_minor,
            description: None,
        };
        let draft = NewJournalEntry {
            company_id: Uuid::nil(),
            entry_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            description: "Overflow".to_string(),
            created_by: None,
            source_reference: None,
            lines: vec![line(i64::MAX, 0), line(i64::MAX, 0), line(0, 5)],
        };
        assert_eq!(draft.total_debit_minor(), i64::MAX);
        assert_eq!(draft.total_credit_minor(), 5);
    }

    #[test]
    fn test_source_reference_json_shape() {
        let reference = SourceReference::new("expense", "42");
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json, serde_json::json!({"type": "expense", "id": "42"}));
    }
}
