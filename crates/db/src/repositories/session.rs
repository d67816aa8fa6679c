use crate::models::DbSession;
use chrono::Utc;
use eyre::Result;
use scheddy_core::interval::TimeInterval;
use scheddy_core::models::{Cancellation, NewSession, SessionMove};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, mentor_id, student_id, type_id, start_time, end_time, timezone, \
     cancelled, cancellation_reason, cancellation_user_level, created_by, created_at";

pub async fn list_active_sessions(pool: &Pool<Postgres>) -> Result<Vec<DbSession>> {
    let sessions = sqlx::query_as::<_, DbSession>(&format!(
        "SELECT {} FROM sessions WHERE NOT cancelled ORDER BY start_time",
        SESSION_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    tracing::debug!("Loaded {} active sessions", sessions.len());
    Ok(sessions)
}

pub async fn get_session_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSession>> {
    tracing::debug!("Getting session by id: {}", id);

    let session = sqlx::query_as::<_, DbSession>(&format!(
        "SELECT {} FROM sessions WHERE id = $1",
        SESSION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Inserts a session occupying `span`. Fails with an exclusion violation
/// (SQLSTATE 23P01) when the mentor already has an overlapping session.
pub async fn create_session(
    pool: &Pool<Postgres>,
    session: &NewSession,
    span: &TimeInterval,
) -> Result<DbSession> {
    let id = Uuid::new_v4();
    tracing::debug!(
        "Creating session: id={}, mentor={}, student={}, span={}",
        id,
        session.mentor_id,
        session.student_id,
        span
    );

    let created = sqlx::query_as::<_, DbSession>(&format!(
        r#"
        INSERT INTO sessions (id, mentor_id, student_id, type_id, start_time, end_time, timezone, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        SESSION_COLUMNS
    ))
    .bind(id)
    .bind(session.mentor_id)
    .bind(session.student_id)
    .bind(&session.type_id)
    .bind(span.start())
    .bind(span.end())
    .bind(&session.timezone)
    .bind(session.created_by)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn reschedule_session(
    pool: &Pool<Postgres>,
    id: Uuid,
    change: &SessionMove,
    span: &TimeInterval,
) -> Result<Option<DbSession>> {
    tracing::debug!("Rescheduling session {} to {}", id, span);

    let session = sqlx::query_as::<_, DbSession>(&format!(
        r#"
        UPDATE sessions
        SET mentor_id = $2, type_id = $3, start_time = $4, end_time = $5, timezone = $6
        WHERE id = $1 AND NOT cancelled
        RETURNING {}
        "#,
        SESSION_COLUMNS
    ))
    .bind(id)
    .bind(change.mentor_id)
    .bind(&change.type_id)
    .bind(span.start())
    .bind(span.end())
    .bind(&change.timezone)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

pub async fn cancel_session(
    pool: &Pool<Postgres>,
    id: Uuid,
    cancellation: &Cancellation,
) -> Result<Option<DbSession>> {
    tracing::debug!("Cancelling session {}", id);

    let session = sqlx::query_as::<_, DbSession>(&format!(
        r#"
        UPDATE sessions
        SET cancelled = TRUE, cancellation_reason = $2, cancellation_user_level = $3
        WHERE id = $1
        RETURNING {}
        "#,
        SESSION_COLUMNS
    ))
    .bind(id)
    .bind(&cancellation.reason)
    .bind(cancellation.user_level)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}
