use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::identity::models::Role;
use crate::identity::repository::require_role;
use crate::interview::controller::{InterviewView, SubmitReceipt};
use crate::resume::models::CandidateDocument;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartInterviewRequest {
    pub candidate_id: Uuid,
    pub document: Option<CandidateDocument>,
}

#[derive(Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct SubmitAnswerRequest {
    pub answer: String,
}

/// POST /api/v1/interviews
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewView>), AppError> {
    let user = require_role(&state.db, req.candidate_id, Role::Interviewee).await?;
    let view = state
        .controller
        .start(
            user.id,
            req.document,
            user.name.as_deref(),
            Some(user.email.as_str()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/interviews/:candidate_id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    Ok(Json(state.controller.view(candidate_id).await?))
}

/// PUT /api/v1/interviews/:candidate_id/draft
pub async fn handle_stage_answer(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<InterviewView>, AppError> {
    Ok(Json(
        state.controller.stage_answer(candidate_id, req.text).await?,
    ))
}

/// POST /api/v1/interviews/:candidate_id/answers
///
/// Returns `accepted: false` (200) when the interview is paused, finished or
/// not started; the submission is ignored.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitReceipt>, AppError> {
    Ok(Json(
        state
            .controller
            .submit_answer(candidate_id, req.answer)
            .await?,
    ))
}

/// POST /api/v1/interviews/:candidate_id/pause
pub async fn handle_pause_interview(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    Ok(Json(state.controller.pause(candidate_id).await?))
}

/// POST /api/v1/interviews/:candidate_id/resume
pub async fn handle_resume_interview(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    Ok(Json(state.controller.resume(candidate_id).await?))
}

/// DELETE /api/v1/interviews/:candidate_id
pub async fn handle_reset_interview(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    Ok(Json(state.controller.reset(candidate_id).await?))
}

/// DELETE /api/v1/interviews/:candidate_id/error
pub async fn handle_clear_error(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    Ok(Json(state.controller.clear_error(candidate_id).await?))
}
