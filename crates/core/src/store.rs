//! Collaborators the engine consumes but does not implement.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::availability::MentorAvailability;
use crate::errors::BookingError;
use crate::interval::TimeInterval;
use crate::models::{
    Caller, Cancellation, Mentor, NewSession, Session, SessionId, SessionMove, SessionType,
    SessionTypeDraft, SessionTypeId, UserId,
};

#[derive(Error, Debug)]
pub enum StoreError {
    /// The write would overlap a non-cancelled session of the same mentor.
    #[error("Overlapping session for mentor {mentor_id}")]
    Conflict { mentor_id: UserId },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] eyre::Report),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => BookingError::SlotNoLongerAvailable,
            StoreError::NotFound(what) => BookingError::NotFound(what),
            StoreError::Backend(report) => BookingError::Storage(report),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for mentors, session types, sessions and availability.
///
/// `insert_session` and `reschedule_session` receive the span the session will
/// occupy and must refuse, atomically, any write that overlaps another
/// non-cancelled session of the same mentor.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn list_session_types(&self) -> StoreResult<Vec<SessionType>>;

    async fn create_session_type(&self, draft: SessionTypeDraft) -> StoreResult<SessionType>;

    async fn update_session_type(
        &self,
        id: &SessionTypeId,
        draft: SessionTypeDraft,
    ) -> StoreResult<SessionType>;

    /// Users holding at least the mentor role.
    async fn list_mentors(&self) -> StoreResult<Vec<Mentor>>;

    async fn get_mentor(&self, id: UserId) -> StoreResult<Option<Mentor>>;

    async fn save_mentor_availability(
        &self,
        id: UserId,
        availability: &MentorAvailability,
    ) -> StoreResult<()>;

    /// Every non-cancelled session.
    async fn list_active_sessions(&self) -> StoreResult<Vec<Session>>;

    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>>;

    async fn insert_session(&self, session: NewSession, span: TimeInterval) -> StoreResult<Session>;

    async fn reschedule_session(
        &self,
        id: SessionId,
        change: SessionMove,
        span: TimeInterval,
    ) -> StoreResult<Session>;

    async fn cancel_session(&self, id: SessionId, cancellation: Cancellation) -> StoreResult<Session>;
}

/// Resolves an opaque caller token to an identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn lookup(&self, token: &str) -> eyre::Result<Option<Caller>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Booked(Session),
    Rescheduled {
        session: Session,
        previous: Session,
    },
    Cancelled {
        session: Session,
        reason: Option<String>,
    },
}

impl SessionEvent {
    pub fn session(&self) -> &Session {
        match self {
            SessionEvent::Booked(session) => session,
            SessionEvent::Rescheduled { session, .. } => session,
            SessionEvent::Cancelled { session, .. } => session,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Booked(_) => "booked",
            SessionEvent::Rescheduled { .. } => "rescheduled",
            SessionEvent::Cancelled { .. } => "cancelled",
        }
    }
}

/// Sends confirmations and cancellations. Runs after the write is durable, so
/// a failure never undoes a booking.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &SessionEvent) -> eyre::Result<()>;
}

/// Records events in the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: &SessionEvent) -> eyre::Result<()> {
        let session = event.session();
        info!(
            "Session {} {}: mentor={}, student={}, start={}",
            session.id,
            event.kind(),
            session.mentor_id,
            session.student_id,
            session.start.to_rfc3339()
        );
        Ok(())
    }
}
