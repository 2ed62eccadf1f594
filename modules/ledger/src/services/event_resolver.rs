//! Event-to-account resolution
//!
//! Maps a ledger event to the well-known accounts it debits and credits.
//! Rules live in a static table; a slot lists candidate roles in preference
//! order and the posting engine uses the first one the company has
//! configured.

use uuid::Uuid;

use crate::contracts::ledger_event_v1::{
    LedgerEventV1, ASSET_PURCHASE_APPROVED, CASH_DEPOSIT, CASH_EXPENSE, CASH_TRANSFER,
    CASH_WITHDRAWAL, EXPENSE_APPROVED,
};
use crate::models::SourceReference;
use crate::validation::{validate_ledger_event, ValidationError};

/// Well-known account a rule can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    CashOnHand,
    Bank,
    FixedAssets,
    /// Not referenced by any event rule yet. Resolves the configured payables
    /// code for callers building manual entries against the well-known chart.
    AccountsPayable,
    OperatingExpenses,
}

/// Account codes the resolver's roles map to, per deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownAccounts {
    pub cash_on_hand: String,
    pub bank: String,
    pub fixed_assets: String,
    pub accounts_payable: String,
    pub operating_expenses: String,
}

impl Default for WellKnownAccounts {
    fn default() -> Self {
        Self {
            cash_on_hand: "1110".to_string(),
            bank: "1120".to_string(),
            fixed_assets: "1500".to_string(),
            accounts_payable: "2100".to_string(),
            operating_expenses: "6100".to_string(),
        }
    }
}

impl WellKnownAccounts {
    pub fn code_for(&self, role: AccountRole) -> &str {
        match role {
            AccountRole::CashOnHand => &self.cash_on_hand,
            AccountRole::Bank => &self.bank,
            AccountRole::FixedAssets => &self.fixed_assets,
            AccountRole::AccountsPayable => &self.accounts_payable,
            AccountRole::OperatingExpenses => &self.operating_expenses,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RuleShape {
    Fixed {
        debit: &'static [AccountRole],
        credit: &'static [AccountRole],
    },
    /// Transfers: deposit shape toward a target bank account, withdrawal
    /// shape otherwise
    ByTargetBank,
}

const DEPOSIT_DEBIT: &[AccountRole] = &[AccountRole::Bank];
const DEPOSIT_CREDIT: &[AccountRole] = &[AccountRole::CashOnHand];
const WITHDRAWAL_DEBIT: &[AccountRole] = &[AccountRole::CashOnHand];
const WITHDRAWAL_CREDIT: &[AccountRole] = &[AccountRole::Bank];

static RULES: &[(&str, RuleShape)] = &[
    (
        EXPENSE_APPROVED,
        RuleShape::Fixed {
            debit: &[AccountRole::OperatingExpenses],
            credit: &[AccountRole::CashOnHand],
        },
    ),
    (
        ASSET_PURCHASE_APPROVED,
        RuleShape::Fixed {
            debit: &[AccountRole::FixedAssets],
            credit: &[AccountRole::Bank, AccountRole::CashOnHand],
        },
    ),
    (
        CASH_DEPOSIT,
        RuleShape::Fixed {
            debit: DEPOSIT_DEBIT,
            credit: DEPOSIT_CREDIT,
        },
    ),
    (
        CASH_WITHDRAWAL,
        RuleShape::Fixed {
            debit: WITHDRAWAL_DEBIT,
            credit: WITHDRAWAL_CREDIT,
        },
    ),
    (CASH_TRANSFER, RuleShape::ByTargetBank),
    (
        CASH_EXPENSE,
        RuleShape::Fixed {
            debit: &[AccountRole::OperatingExpenses],
            credit: &[AccountRole::CashOnHand],
        },
    ),
];

/// A two-line posting the engine should attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedPosting {
    pub company_id: Uuid,
    pub amount_minor: i64,
    pub entry_date: chrono::NaiveDate,
    pub description: String,
    pub source_reference: SourceReference,
    pub created_by: Option<Uuid>,
    /// Candidate roles for the debit line, in preference order
    pub debit_roles: &'static [AccountRole],
    /// Candidate roles for the credit line, in preference order
    pub credit_roles: &'static [AccountRole],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Post(ProposedPosting),
    /// No rule for this event type
    Unsupported,
}

/// Event types with a posting rule
pub fn supported_event_types() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|(event_type, _)| *event_type)
}

/// Resolve an event against the rules table
///
/// Unsupported event types resolve before the payload is validated, so an
/// unknown event never fails.
pub fn resolve(event: &LedgerEventV1) -> Result<Resolution, ValidationError> {
    let Some((_, shape)) = RULES.iter().find(|(t, _)| *t == event.event_type) else {
        return Ok(Resolution::Unsupported);
    };

    let amount_minor = validate_ledger_event(event)?;

    let (debit_roles, credit_roles) = match *shape {
        RuleShape::Fixed { debit, credit } => (debit, credit),
        RuleShape::ByTargetBank => match event.target_bank_account_id.as_deref() {
            Some(target) if !target.trim().is_empty() => (DEPOSIT_DEBIT, DEPOSIT_CREDIT),
            _ => (WITHDRAWAL_DEBIT, WITHDRAWAL_CREDIT),
        },
    };

    Ok(Resolution::Post(ProposedPosting {
        company_id: event.company_id,
        amount_minor,
        entry_date: event.date,
        description: event.description.clone(),
        source_reference: event.source_reference.clone(),
        created_by: event.created_by,
        debit_roles,
        credit_roles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn event(event_type: &str) -> LedgerEventV1 {
        LedgerEventV1 {
            event_type: event_type.to_string(),
            company_id: Uuid::new_v4(),
            amount: Decimal::from(100),
            date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            description: "Test".to_string(),
            source_reference: SourceReference::new("cash_transaction", "1"),
            target_bank_account_id: None,
            created_by: None,
        }
    }

    fn roles(resolution: Resolution) -> (&'static [AccountRole], &'static [AccountRole]) {
        match resolution {
            Resolution::Post(p) => (p.debit_roles, p.credit_roles),
            Resolution::Unsupported => panic!("expected a posting"),
        }
    }

    #[test]
    fn test_expense_rules() {
        for event_type in [EXPENSE_APPROVED, CASH_EXPENSE] {
            let (debit, credit) = roles(resolve(&event(event_type)).unwrap());
            assert_eq!(debit, &[AccountRole::OperatingExpenses]);
            assert_eq!(credit, &[AccountRole::CashOnHand]);
        }
    }

    #[test]
    fn test_asset_purchase_prefers_bank() {
        let (debit, credit) = roles(resolve(&event(ASSET_PURCHASE_APPROVED)).unwrap());
        assert_eq!(debit, &[AccountRole::FixedAssets]);
        assert_eq!(credit, &[AccountRole::Bank, AccountRole::CashOnHand]);
    }

    #[test]
    fn test_deposit_and_withdrawal() {
        let (debit, credit) = roles(resolve(&event(CASH_DEPOSIT)).unwrap());
        assert_eq!((debit, credit), (DEPOSIT_DEBIT, DEPOSIT_CREDIT));

        let (debit, credit) = roles(resolve(&event(CASH_WITHDRAWAL)).unwrap());
        assert_eq!(debit, &[AccountRole::CashOnHand]);
        assert_eq!(credit, &[AccountRole::Bank]);
    }

    #[test]
    fn test_transfer_direction_follows_target_bank() {
        let mut transfer = event(CASH_TRANSFER);
        let (debit, _) = roles(resolve(&transfer).unwrap());
        assert_eq!(debit, &[AccountRole::CashOnHand]);

        transfer.target_bank_account_id = Some("bank_01".to_string());
        let (debit, credit) = roles(resolve(&transfer).unwrap());
        assert_eq!(debit, &[AccountRole::Bank]);
        assert_eq!(credit, &[AccountRole::CashOnHand]);
    }

    #[test]
    fn test_unknown_event_is_unsupported_even_if_invalid() {
        let mut unknown = event("invoice.sent");
        unknown.amount = Decimal::ZERO;
        assert_eq!(resolve(&unknown), Ok(Resolution::Unsupported));
    }

    #[test]
    fn test_known_event_with_bad_amount_fails() {
        let mut bad = event(EXPENSE_APPROVED);
        bad.amount = Decimal::new(1, 3);
        assert!(matches!(resolve(&bad), Err(ValidationError::InvalidAmount(_))));
    }

    #[test]
    fn test_no_event_rule_uses_accounts_payable() {
        for event_type in supported_event_types() {
            let (debit, credit) = roles(resolve(&event(event_type)).unwrap());
            assert!(!debit.contains(&AccountRole::AccountsPayable), "{}", event_type);
            assert!(!credit.contains(&AccountRole::AccountsPayable), "{}", event_type);
        }
    }

    #[test]
    fn test_default_codes() {
        let codes = WellKnownAccounts::default();
        assert_eq!(codes.code_for(AccountRole::CashOnHand), "1110");
        assert_eq!(codes.code_for(AccountRole::Bank), "1120");
        assert_eq!(codes.code_for(AccountRole::FixedAssets), "1500");
        assert_eq!(codes.code_for(AccountRole::AccountsPayable), "2100");
        assert_eq!(codes.code_for(AccountRole::OperatingExpenses), "6100");
        assert_eq!(supported_event_types().count(), 6);
    }
}
