//! Manual (compound) journal entry request
//!
//! Adjustments that are not driven by a business event post their lines
//! directly. Lines reference accounts by company-scoped code.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::SourceReference;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualEntryRequestV1 {
    pub company_id: Uuid,

    pub entry_date: NaiveDate,

    /// Entry description (1-500 chars)
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<SourceReference>,

    /// At least 2 lines; each line is a debit xor a credit
    pub lines: Vec<ManualEntryLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualEntryLine {
    pub account_code: String,

    #[serde(default)]
    pub debit: Decimal,

    #[serde(default)]
    pub credit: Decimal,

    /// Optional line description (<= 500 chars)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ManualEntryLine {
    pub fn debit(account_code: &str, amount: Decimal) -> Self {
        Self {
            account_code: account_code.to_string(),
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    pub fn credit(account_code: &str, amount: Decimal) -> Self {
        Self {
            account_code: account_code.to_string(),
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_side_defaults_to_zero() {
        let json = r#"{
            "company_id": "6f1c1a0e-4f1d-4c59-9b8e-2f0b2d4f8a11",
            "entry_date": "2026-01-31",
            "description": "Accrue January payroll",
            "lines": [
                {"account_code": "6100", "debit": "2500.00"},
                {"account_code": "2100", "credit": "2500.00", "description": "Payroll payable"}
            ]
        }"#;

        let request: ManualEntryRequestV1 = serde_json::from_str(json).unwrap();
        assert_eq!(request.lines.len(), 2);
        assert_eq!(request.lines[0].credit, Decimal::ZERO);
        assert_eq!(request.lines[1].debit, Decimal::ZERO);
        assert_eq!(request.lines[1].description.as_deref(), Some("Payroll payable"));
        assert_eq!(request.source_reference, None);
    }
}
