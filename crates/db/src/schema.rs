use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Needed for the mentor equality part of the overlap constraint
    sqlx::query("CREATE EXTENSION IF NOT EXISTS btree_gist;")
        .execute(pool)
        .await?;

    // Create users table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGINT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            role INTEGER NOT NULL DEFAULT 0,
            role_override INTEGER NOT NULL DEFAULT -1,
            rating INTEGER NOT NULL DEFAULT 0,
            timezone VARCHAR(64) NULL,
            mentor_availability JSONB NULL,
            allowed_session_types TEXT[] NULL,
            bookable_session_types TEXT[] NULL,
            allow_bookings BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create user_tokens table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_tokens (
            token VARCHAR(255) PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            expires_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create session_types table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session_types (
            id VARCHAR(64) PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            category VARCHAR(255) NOT NULL,
            length_minutes INTEGER NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0,
            min_rating INTEGER NOT NULL DEFAULT 2,
            bookable BOOLEAN NOT NULL DEFAULT TRUE,
            CONSTRAINT positive_length CHECK (length_minutes > 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create sessions table. end_time is the span at write time and backs the
    // exclusion constraint that keeps a mentor from being double-booked.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            mentor_id BIGINT NOT NULL REFERENCES users(id),
            student_id BIGINT NOT NULL REFERENCES users(id),
            type_id VARCHAR(64) NOT NULL REFERENCES session_types(id),
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            timezone VARCHAR(64) NOT NULL,
            cancelled BOOLEAN NOT NULL DEFAULT FALSE,
            cancellation_reason TEXT NULL,
            cancellation_user_level INTEGER NULL,
            created_by BIGINT NULL REFERENCES users(id),
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_session_range CHECK (end_time > start_time),
            CONSTRAINT no_overlapping_sessions EXCLUDE USING gist (
                mentor_id WITH =,
                tstzrange(start_time, end_time, '[)') WITH &&
            ) WHERE (NOT cancelled)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_sessions_student_id ON sessions(student_id);",
        "CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);",
        "CREATE INDEX IF NOT EXISTS idx_sessions_active ON sessions(mentor_id) WHERE NOT cancelled;",
        "CREATE INDEX IF NOT EXISTS idx_user_tokens_user_id ON user_tokens(user_id);",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
