use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::identity::models::{Role, User};

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("user {}: {e}", row.id)))?;
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            created_at: row.created_at,
        })
    }
}

/// Normalises an email for lookups: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Rejects registering an existing account under a different role.
pub fn check_role(existing: &User, requested: Role) -> Result<(), AppError> {
    if existing.role != requested {
        return Err(AppError::Conflict(format!(
            "Account already exists as {}. Please sign in with your existing role.",
            existing.role.as_str()
        )));
    }
    Ok(())
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, email, name, role, created_at FROM users WHERE email = $1",
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?
    .map(User::try_from)
    .transpose()
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, UserRow>("SELECT id, email, name, role, created_at FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(User::try_from)
        .transpose()
}

/// Registers a user, or returns the existing account when the email is
/// already known under the same role. The bool is true for a new account.
pub async fn register_user(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    role: Role,
) -> Result<(User, bool), AppError> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }

    if let Some(existing) = find_user_by_email(pool, &email).await? {
        check_role(&existing, role)?;
        return Ok((existing, false));
    }

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, email, name, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, name, role, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(name.map(str::trim).filter(|n| !n.is_empty()))
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    let user = User::try_from(row)?;
    info!(user_id = %user.id, role = role.as_str(), "Registered user");
    Ok((user, true))
}

/// Loads a user and checks their role, for routes restricted to one role.
pub async fn require_role(pool: &PgPool, id: Uuid, role: Role) -> Result<User, AppError> {
    let user = get_user(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            name: Some("Jane".to_string()),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_same_role_is_accepted() {
        assert!(check_role(&user(Role::Interviewee), Role::Interviewee).is_ok());
    }

    #[test]
    fn test_role_conflict_message() {
        let err = check_role(&user(Role::Interviewer), Role::Interviewee).unwrap_err();
        match err {
            AppError::Conflict(message) => assert_eq!(
                message,
                "Account already exists as interviewer. Please sign in with your existing role."
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }

    #[test]
    fn test_row_with_unknown_role_is_rejected() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "x@y.z".to_string(),
            name: None,
            role: "admin".to_string(),
            created_at: Utc::now(),
        };
        assert!(User::try_from(row).is_err());
    }
}
