use crate::models::DbUser;
use eyre::Result;
use sqlx::{Pool, Postgres};

const USER_COLUMNS: &str = "id, name, role, role_override, rating, timezone, mentor_availability, \
     allowed_session_types, bookable_session_types, allow_bookings, created_at";

/// Users whose effective role is mentor or above.
pub async fn list_mentors(pool: &Pool<Postgres>) -> Result<Vec<DbUser>> {
    tracing::debug!("Listing mentors");

    let mentors = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE GREATEST(role, role_override) >= 20 ORDER BY id",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    tracing::debug!("Found {} mentors", mentors.len());
    Ok(mentors)
}

pub async fn get_mentor_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<DbUser>> {
    tracing::debug!("Getting mentor by id: {}", id);

    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND GREATEST(role, role_override) >= 20",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Resolves an unexpired session token to its user.
pub async fn get_user_by_token(pool: &Pool<Postgres>, token: &str) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        r#"
        SELECT {}
        FROM users
        WHERE id = (
            SELECT user_id FROM user_tokens
            WHERE token = $1 AND (expires_at IS NULL OR expires_at > NOW())
        )
        "#,
        USER_COLUMNS
    ))
    .bind(token)
    .fetch_optional(pool)
    .await?;

    if user.is_none() {
        tracing::debug!("No user for presented token");
    }
    Ok(user)
}

/// Replaces the stored availability document. Returns false when the user
/// does not exist.
pub async fn update_mentor_availability(
    pool: &Pool<Postgres>,
    id: i64,
    availability: &serde_json::Value,
) -> Result<bool> {
    tracing::debug!("Updating availability for user {}", id);

    let result = sqlx::query(
        r#"
        UPDATE users
        SET mentor_availability = $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(availability)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
