use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::interview::controller::InterviewController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Accounts and roles.
    pub db: PgPool,
    pub config: Config,
    /// Owns interview sessions and candidate profiles.
    pub controller: Arc<InterviewController>,
}
