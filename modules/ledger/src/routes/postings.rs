//! Posting, audit listing and reversal endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, AppState, CompanyQuery};
use crate::contracts::{LedgerEventV1, ManualEntryRequestV1};
use crate::models::{JournalEntry, JournalEntryWithLines};
use crate::services::posting_engine::PostingOutcome;

fn outcome_status(outcome: &PostingOutcome) -> StatusCode {
    match outcome {
        PostingOutcome::Posted { .. } => StatusCode::CREATED,
        PostingOutcome::Duplicate { .. } => StatusCode::OK,
        PostingOutcome::Skipped { .. } => StatusCode::ACCEPTED,
    }
}

/// POST /api/ledger/events
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<LedgerEventV1>,
) -> Result<(StatusCode, Json<PostingOutcome>), ApiError> {
    let outcome = state.engine.post_event(&event).await?;
    Ok((outcome_status(&outcome), Json(outcome)))
}

/// POST /api/ledger/entries
pub async fn post_manual_entry(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ManualEntryRequestV1>,
) -> Result<(StatusCode, Json<PostingOutcome>), ApiError> {
    let outcome = state.engine.post_manual_entry(&request).await?;
    Ok((outcome_status(&outcome), Json(outcome)))
}

/// GET /api/ledger/entries?company_id=
///
/// Audit listing: every entry in any status, ordered by entry number.
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<Vec<JournalEntryWithLines>>, ApiError> {
    Ok(Json(state.store().list_entries(params.company_id).await?))
}

/// POST /api/ledger/entries/{id}/reverse?company_id=
pub async fn reverse_entry(
    State(state): State<Arc<AppState>>,
    Path(entry_id): Path<Uuid>,
    Query(params): Query<CompanyQuery>,
) -> Result<Json<JournalEntry>, ApiError> {
    Ok(Json(
        state
            .engine
            .reverse_entry(params.company_id, entry_id)
            .await?,
    ))
}
