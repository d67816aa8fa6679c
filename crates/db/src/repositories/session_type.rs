use crate::models::DbSessionType;
use eyre::Result;
use scheddy_core::models::SessionTypeDraft;
use sqlx::{Pool, Postgres};

pub async fn list_session_types(pool: &Pool<Postgres>) -> Result<Vec<DbSessionType>> {
    let types = sqlx::query_as::<_, DbSessionType>(
        r#"
        SELECT id, name, category, length_minutes, sort_order, min_rating, bookable
        FROM session_types
        ORDER BY sort_order, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    tracing::debug!("Loaded {} session types", types.len());
    Ok(types)
}

pub async fn create_session_type(
    pool: &Pool<Postgres>,
    id: &str,
    draft: &SessionTypeDraft,
) -> Result<DbSessionType> {
    tracing::debug!("Creating session type: id={}, name={}", id, draft.name);

    let session_type = sqlx::query_as::<_, DbSessionType>(
        r#"
        INSERT INTO session_types (id, name, category, length_minutes, sort_order, min_rating, bookable)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, name, category, length_minutes, sort_order, min_rating, bookable
        "#,
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.category)
    .bind(i32::try_from(draft.length_minutes)?)
    .bind(draft.order)
    .bind(draft.min_rating)
    .bind(draft.bookable)
    .fetch_one(pool)
    .await?;

    Ok(session_type)
}

pub async fn update_session_type(
    pool: &Pool<Postgres>,
    id: &str,
    draft: &SessionTypeDraft,
) -> Result<Option<DbSessionType>> {
    tracing::debug!("Updating session type: id={}", id);

    let session_type = sqlx::query_as::<_, DbSessionType>(
        r#"
        UPDATE session_types
        SET name = $2, category = $3, length_minutes = $4, sort_order = $5,
            min_rating = $6, bookable = $7
        WHERE id = $1
        RETURNING id, name, category, length_minutes, sort_order, min_rating, bookable
        "#,
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.category)
    .bind(i32::try_from(draft.length_minutes)?)
    .bind(draft.order)
    .bind(draft.min_rating)
    .bind(draft.bookable)
    .fetch_optional(pool)
    .await?;

    Ok(session_type)
}
