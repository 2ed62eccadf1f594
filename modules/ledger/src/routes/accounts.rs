//! Chart of Accounts endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, AppState, CompanyQuery};
use crate::models::{Account, AccountStatus, NewAccount};

/// Account with derived fields
#[derive(Debug, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    pub normal_balance: &'static str,
    pub full_code: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub company_id: Uuid,
    pub status: AccountStatus,
}

/// POST /api/ledger/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewAccount>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = state.engine.registry().create_account(request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /api/ledger/accounts?company_id=
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<Vec<AccountView>>, ApiError> {
    let accounts = state
        .engine
        .registry()
        .list_with_full_codes(params.company_id)
        .await?
        .into_iter()
        .map(|(account, full_code)| AccountView {
            normal_balance: account.normal_balance().as_str(),
            account,
            full_code,
        })
        .collect();
    Ok(Json(accounts))
}

/// POST /api/ledger/accounts/{id}/status
pub async fn set_account_status(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .engine
        .registry()
        .set_status(request.company_id, account_id, request.status)
        .await?;
    Ok(Json(account))
}

/// DELETE /api/ledger/accounts/{id}?company_id=
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Query(params): Query<CompanyQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .registry()
        .delete_account(params.company_id, account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
