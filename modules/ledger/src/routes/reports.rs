//! Trial balance and general ledger endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::services::general_ledger_service::{self, GeneralLedgerResponse};
use crate::services::trial_balance_service::{self, TrialBalanceResponse};

#[derive(Debug, Deserialize)]
pub struct TrialBalanceQuery {
    pub company_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralLedgerQuery {
    pub company_id: Uuid,
    pub account_code: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub include_reversed: bool,
}

/// GET /api/ledger/trial-balance?company_id=&from=&to=
pub async fn get_trial_balance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrialBalanceQuery>,
) -> Result<Json<TrialBalanceResponse>, ApiError> {
    let response = trial_balance_service::get_trial_balance(
        state.store(),
        params.company_id,
        params.from,
        params.to,
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/ledger/general-ledger?company_id=&account_code=&from=&to=&include_reversed=
pub async fn get_general_ledger(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GeneralLedgerQuery>,
) -> Result<Json<GeneralLedgerResponse>, ApiError> {
    let response = general_ledger_service::get_general_ledger(
        state.store(),
        params.company_id,
        &params.account_code,
        params.from,
        params.to,
        params.include_reversed,
    )
    .await?;
    Ok(Json(response))
}
