use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::candidates::aggregator::{recompute, CandidateProfile};
use crate::errors::AppError;
use crate::interview::models::InterviewSession;

/// Durable storage for candidate profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<CandidateProfile>, AppError>;
    async fn save(&self, profile: &CandidateProfile) -> Result<(), AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[derive(Debug, FromRow)]
struct CandidateProfileRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    sessions: Json<Vec<InterviewSession>>,
}

impl From<CandidateProfileRow> for CandidateProfile {
    fn from(row: CandidateProfileRow) -> Self {
        let mut profile = CandidateProfile {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            sessions: row.sessions.0,
            total_sessions: 0,
            average_score: None,
            last_interview_date: None,
        };
        recompute(&mut profile);
        profile
    }
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load_all(&self) -> Result<Vec<CandidateProfile>, AppError> {
        let rows = sqlx::query_as::<_, CandidateProfileRow>(
            "SELECT id, name, email, phone, sessions FROM candidate_profiles ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CandidateProfile::from).collect())
    }

    async fn save(&self, profile: &CandidateProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO candidate_profiles (id, name, email, phone, sessions)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
               SET name = EXCLUDED.name,
                   email = EXCLUDED.email,
                   phone = EXCLUDED.phone,
                   sessions = EXCLUDED.sessions,
                   updated_at = NOW()
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(Json(&profile.sessions))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM candidate_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::fallback::fallback_questions;
    use crate::resume::models::CandidateDocument;

    #[test]
    fn test_row_conversion_recomputes_derived_fields() {
        let id = Uuid::new_v4();
        let mut session = InterviewSession::new(id, CandidateDocument::default(), fallback_questions());
        session.is_completed = true;
        session.total_score = Some(64);

        let profile = CandidateProfile::from(CandidateProfileRow {
            id,
            name: "Jane Roe".to_string(),
            email: "jane@example.com".to_string(),
            phone: None,
            sessions: Json(vec![session]),
        });
        assert_eq!(profile.total_sessions, 1);
        assert_eq!(profile.average_score, Some(64.0));
        assert!(profile.last_interview_date.is_some());
    }
}
