//! HTTP surface
//!
//! Every handler is a thin adapter over the services; errors from any layer
//! become a `{ "error": ... }` body through [`ApiError`].

pub mod accounts;
pub mod health;
pub mod postings;
pub mod reports;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::metrics::Metrics;
use crate::services::account_registry::AccountError;
use crate::services::posting_engine::{PostingEngine, PostingError};
use crate::services::ReportError;
use crate::store::{LedgerStore, StoreError};

/// Shared state for every handler
pub struct AppState {
    pub engine: Arc<PostingEngine>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn store(&self) -> &dyn LedgerStore {
        self.engine.store().as_ref()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route(
            "/api/ledger/accounts",
            post(accounts::create_account).get(accounts::list_accounts),
        )
        .route("/api/ledger/accounts/{id}/status", post(accounts::set_account_status))
        .route("/api/ledger/accounts/{id}", delete(accounts::delete_account))
        .route("/api/ledger/events", post(postings::post_event))
        .route(
            "/api/ledger/entries",
            post(postings::post_manual_entry).get(postings::list_entries),
        )
        .route("/api/ledger/entries/{id}/reverse", post(postings::reverse_entry))
        .route("/api/ledger/trial-balance", get(reports::get_trial_balance))
        .route("/api/ledger/general-ledger", get(reports::get_general_ledger))
        .with_state(state)
}

/// `?company_id=` query used by company-scoped endpoints
#[derive(Debug, Deserialize)]
pub struct CompanyQuery {
    pub company_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error response wrapper for proper HTTP error handling
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::DuplicateAccountCode { .. }
        | StoreError::AccountInUse(_)
        | StoreError::InvalidTransition { .. }
        | StoreError::SequenceConflict(_)
        | StoreError::ReferenceConflict { .. } => StatusCode::CONFLICT,
        StoreError::InvalidParent(_) => StatusCode::BAD_REQUEST,
        StoreError::AccountInactive { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::AccountNotFound(_) | StoreError::EntryNotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Write(_) | StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::new(store_status(&err), err.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let status = match &err {
            AccountError::NotConfigured { .. } => StatusCode::NOT_FOUND,
            AccountError::Inactive { .. } | AccountError::HierarchyTooDeep(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AccountError::InvalidAccount(_) => StatusCode::BAD_REQUEST,
            AccountError::Store(e) => store_status(e),
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<PostingError> for ApiError {
    fn from(err: PostingError) -> Self {
        let status = match &err {
            PostingError::AccountNotConfigured { .. } | PostingError::AccountInactive { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PostingError::UnbalancedEntryAttempt { .. } | PostingError::InvalidEvent(_) => {
                StatusCode::BAD_REQUEST
            }
            PostingError::EntryNotFound(_) => StatusCode::NOT_FOUND,
            PostingError::InvalidTransition { .. } => StatusCode::CONFLICT,
            PostingError::Registry(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PostingError::Store(e) => store_status(e),
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        let status = match &err {
            ReportError::InvalidDateRange { .. } => StatusCode::BAD_REQUEST,
            ReportError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
            ReportError::AmountOverflow => StatusCode::INTERNAL_SERVER_ERROR,
            ReportError::Store(e) => store_status(e),
        };
        ApiError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_error_status() {
        let err: ApiError = PostingError::AccountNotConfigured {
            company_id: Uuid::nil(),
            code: "6100".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = PostingError::Store(StoreError::SequenceConflict(Uuid::nil())).into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = PostingError::Store(StoreError::Write("disk".to_string())).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_account_error_status() {
        let err: ApiError = AccountError::Store(StoreError::AccountInUse(Uuid::nil())).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(err.message.contains("cannot be deleted"));
    }
}
