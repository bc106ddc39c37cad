//! Axum route handlers for résumé upload and parsing.

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::resume::document::{extract_text, validate_upload};
use crate::resume::extractor::extract_candidate_document;
use crate::resume::models::CandidateDocument;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "resume";

/// POST /api/v1/resumes/parse
///
/// Accepts a multipart upload (field `resume`, PDF or DOCX) and returns the
/// extracted CandidateDocument. The file itself is not stored.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CandidateDocument>, AppError> {
    let max_bytes = state.config.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Uploaded file has no name".to_string()))?;

        // Reject by extension before reading the body.
        validate_upload(&file_name, 1, max_bytes)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file: {e}")))?;

        info!(file_name = %file_name, size = bytes.len(), "Parsing uploaded résumé");

        let name_for_task = file_name.clone();
        let document = tokio::task::spawn_blocking(move || {
            extract_text(&name_for_task, &bytes, max_bytes)
                .map(|text| extract_candidate_document(&name_for_task, &text))
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in parsing: {e}")))?
        .map_err(|e| {
            warn!(file_name = %file_name, "Résumé parsing failed: {e:?}");
            AppError::from(e)
        })?;

        return Ok(Json(document));
    }

    Err(AppError::Validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}
