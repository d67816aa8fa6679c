//! [`BookingStore`] and [`IdentityProvider`] on top of Postgres.

use async_trait::async_trait;
use eyre::WrapErr;
use scheddy_core::availability::MentorAvailability;
use scheddy_core::interval::TimeInterval;
use scheddy_core::models::{
    Caller, Cancellation, Mentor, NewSession, Session, SessionId, SessionMove, SessionType,
    SessionTypeDraft, SessionTypeId, UserId,
};
use scheddy_core::store::{BookingStore, IdentityProvider, StoreError, StoreResult};
use uuid::Uuid;

use crate::repositories::{session, session_type, user};
use crate::DbPool;

/// SQLSTATE raised when an exclusion constraint rejects a row.
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// True when `report` wraps an exclusion-constraint violation.
pub fn is_overlap_violation(report: &eyre::Report) -> bool {
    report
        .downcast_ref::<sqlx::Error>()
        .and_then(|err| err.as_database_error())
        .and_then(|err| err.code())
        .map_or(false, |code| code == EXCLUSION_VIOLATION)
}

fn session_write_error(report: eyre::Report, mentor_id: UserId) -> StoreError {
    if is_overlap_violation(&report) {
        StoreError::Conflict { mentor_id }
    } else {
        StoreError::Backend(report)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn list_session_types(&self) -> StoreResult<Vec<SessionType>> {
        let rows = session_type::list_session_types(&self.pool).await?;
        Ok(rows.into_iter().map(SessionType::from).collect())
    }

    async fn create_session_type(&self, draft: SessionTypeDraft) -> StoreResult<SessionType> {
        let id = Uuid::new_v4().simple().to_string();
        let row = session_type::create_session_type(&self.pool, &id, &draft)
            .await
            .wrap_err("Failed to create session type")?;
        Ok(row.into())
    }

    async fn update_session_type(
        &self,
        id: &SessionTypeId,
        draft: SessionTypeDraft,
    ) -> StoreResult<SessionType> {
        session_type::update_session_type(&self.pool, id, &draft)
            .await?
            .map(SessionType::from)
            .ok_or_else(|| StoreError::NotFound(format!("Session type {}", id)))
    }

    async fn list_mentors(&self) -> StoreResult<Vec<Mentor>> {
        let rows = user::list_mentors(&self.pool).await?;
        Ok(rows.into_iter().map(|row| row.into_mentor()).collect())
    }

    async fn get_mentor(&self, id: UserId) -> StoreResult<Option<Mentor>> {
        let row = user::get_mentor_by_id(&self.pool, id).await?;
        Ok(row.map(|row| row.into_mentor()))
    }

    async fn save_mentor_availability(
        &self,
        id: UserId,
        availability: &MentorAvailability,
    ) -> StoreResult<()> {
        let document = serde_json::to_value(availability)
            .wrap_err("Failed to encode mentor availability")?;
        if user::update_mentor_availability(&self.pool, id, &document).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("Mentor {}", id)))
        }
    }

    async fn list_active_sessions(&self) -> StoreResult<Vec<Session>> {
        let rows = session::list_active_sessions(&self.pool).await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        let row = session::get_session_by_id(&self.pool, id).await?;
        Ok(row.map(Session::from))
    }

    async fn insert_session(&self, new: NewSession, span: TimeInterval) -> StoreResult<Session> {
        let mentor_id = new.mentor_id;
        session::create_session(&self.pool, &new, &span)
            .await
            .map(Session::from)
            .map_err(|e| session_write_error(e, mentor_id))
    }

    async fn reschedule_session(
        &self,
        id: SessionId,
        change: SessionMove,
        span: TimeInterval,
    ) -> StoreResult<Session> {
        let mentor_id = change.mentor_id;
        session::reschedule_session(&self.pool, id, &change, &span)
            .await
            .map_err(|e| session_write_error(e, mentor_id))?
            .map(Session::from)
            .ok_or_else(|| StoreError::NotFound(format!("Session {}", id)))
    }

    async fn cancel_session(&self, id: SessionId, cancellation: Cancellation) -> StoreResult<Session> {
        session::cancel_session(&self.pool, id, &cancellation)
            .await?
            .map(Session::from)
            .ok_or_else(|| StoreError::NotFound(format!("Session {}", id)))
    }
}

#[async_trait]
impl IdentityProvider for PgStore {
    async fn lookup(&self, token: &str) -> eyre::Result<Option<Caller>> {
        let row = user::get_user_by_token(&self.pool, token).await?;
        Ok(row.map(|row| row.into_caller()))
    }
}
