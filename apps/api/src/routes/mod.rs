pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::identity::handlers as identity;
use crate::interview::handlers as interview;
use crate::resume::handlers as resume;
use crate::state::AppState;

/// Multipart framing on top of the document itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Identity
        .route("/api/v1/users", post(identity::handle_register))
        .route("/api/v1/users/:id", get(identity::handle_get_user))
        // Résumé intake
        .route(
            "/api/v1/resumes/parse",
            post(resume::handle_parse_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Interview sessions
        .route("/api/v1/interviews", post(interview::handle_start_interview))
        .route(
            "/api/v1/interviews/:candidate_id",
            get(interview::handle_get_interview).delete(interview::handle_reset_interview),
        )
        .route(
            "/api/v1/interviews/:candidate_id/draft",
            put(interview::handle_stage_answer),
        )
        .route(
            "/api/v1/interviews/:candidate_id/answers",
            post(interview::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:candidate_id/pause",
            post(interview::handle_pause_interview),
        )
        .route(
            "/api/v1/interviews/:candidate_id/resume",
            post(interview::handle_resume_interview),
        )
        .route(
            "/api/v1/interviews/:candidate_id/error",
            delete(interview::handle_clear_error),
        )
        // Interviewer dashboard
        .route("/api/v1/candidates", get(candidates::handle_list_candidates))
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate)
                .patch(candidates::handle_update_candidate)
                .delete(candidates::handle_remove_candidate),
        )
        .with_state(state)
}
