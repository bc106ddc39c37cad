//! Interviewer-only routes. Every request names its viewer, whose role is
//! checked before anything is read.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidates::aggregator::{
    CandidateProfile, CandidateSummary, DashboardStats, ProfileUpdate, SortKey, SortOrder,
};
use crate::errors::AppError;
use crate::identity::models::Role;
use crate::identity::repository::require_role;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub viewer_id: Uuid,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub viewer_id: Uuid,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Serialize)]
pub struct CandidateListResponse {
    pub candidates: Vec<CandidateSummary>,
    pub stats: DashboardStats,
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<CandidateListResponse>, AppError> {
    require_role(&state.db, params.viewer_id, Role::Interviewer).await?;
    let (candidates, stats) = state
        .controller
        .list_candidates(params.search.as_deref(), params.sort, params.order)
        .await;
    Ok(Json(CandidateListResponse { candidates, stats }))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<CandidateProfile>, AppError> {
    require_role(&state.db, params.viewer_id, Role::Interviewer).await?;
    state
        .controller
        .candidate(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

/// PATCH /api/v1/candidates/:id
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<CandidateProfile>, AppError> {
    require_role(&state.db, params.viewer_id, Role::Interviewer).await?;
    Ok(Json(state.controller.update_candidate(id, update).await?))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_remove_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<StatusCode, AppError> {
    require_role(&state.db, params.viewer_id, Role::Interviewer).await?;
    state.controller.remove_candidate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
