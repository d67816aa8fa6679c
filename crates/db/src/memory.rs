//! A [`BookingStore`] kept entirely in process memory.
//!
//! Writes take one lock over the whole state, so the overlap check and the
//! insert happen atomically, matching the exclusion constraint in Postgres.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use scheddy_core::availability::MentorAvailability;
use scheddy_core::interval::TimeInterval;
use scheddy_core::models::{
    Caller, Cancellation, Mentor, NewSession, Session, SessionId, SessionMove, SessionType,
    SessionTypeDraft, SessionTypeId, UserId,
};
use scheddy_core::store::{BookingStore, IdentityProvider, StoreError, StoreResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    session_types: BTreeMap<SessionTypeId, SessionType>,
    mentors: BTreeMap<UserId, Mentor>,
    callers: HashMap<String, Caller>,
    /// Each session with the span it occupied when written.
    sessions: BTreeMap<SessionId, (Session, TimeInterval)>,
}

impl State {
    fn overlaps(&self, mentor_id: UserId, span: &TimeInterval, ignore: Option<SessionId>) -> bool {
        self.sessions.values().any(|(session, occupied)| {
            Some(session.id) != ignore
                && session.is_active()
                && session.mentor_id == mentor_id
                && occupied.intersects(span)
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_session_type(&self, session_type: SessionType) {
        let mut state = self.state.write().await;
        state
            .session_types
            .insert(session_type.id.clone(), session_type);
    }

    pub async fn add_mentor(&self, mentor: Mentor) {
        let mut state = self.state.write().await;
        state.mentors.insert(mentor.id, mentor);
    }

    /// Registers `caller` under `token` for [`IdentityProvider::lookup`].
    pub async fn add_caller(&self, token: &str, caller: Caller) {
        let mut state = self.state.write().await;
        state.callers.insert(token.to_string(), caller);
    }

    /// Stores `session` as-is, without the overlap check.
    pub async fn add_session(&self, session: Session, span: TimeInterval) {
        let mut state = self.state.write().await;
        state.sessions.insert(session.id, (session, span));
    }

    pub async fn sessions(&self) -> Vec<Session> {
        let state = self.state.read().await;
        state
            .sessions
            .values()
            .map(|(session, _)| session.clone())
            .collect()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn list_session_types(&self) -> StoreResult<Vec<SessionType>> {
        let state = self.state.read().await;
        Ok(state.session_types.values().cloned().collect())
    }

    async fn create_session_type(&self, draft: SessionTypeDraft) -> StoreResult<SessionType> {
        let session_type = draft.into_session_type(Uuid::new_v4().simple().to_string());
        let mut state = self.state.write().await;
        state
            .session_types
            .insert(session_type.id.clone(), session_type.clone());
        Ok(session_type)
    }

    async fn update_session_type(
        &self,
        id: &SessionTypeId,
        draft: SessionTypeDraft,
    ) -> StoreResult<SessionType> {
        let mut state = self.state.write().await;
        let slot = state
            .session_types
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("Session type {}", id)))?;
        *slot = draft.into_session_type(id.clone());
        Ok(slot.clone())
    }

    async fn list_mentors(&self) -> StoreResult<Vec<Mentor>> {
        let state = self.state.read().await;
        Ok(state.mentors.values().cloned().collect())
    }

    async fn get_mentor(&self, id: UserId) -> StoreResult<Option<Mentor>> {
        let state = self.state.read().await;
        Ok(state.mentors.get(&id).cloned())
    }

    async fn save_mentor_availability(
        &self,
        id: UserId,
        availability: &MentorAvailability,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let mentor = state
            .mentors
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Mentor {}", id)))?;
        mentor.availability = Some(availability.clone());
        Ok(())
    }

    async fn list_active_sessions(&self) -> StoreResult<Vec<Session>> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .values()
            .filter(|(session, _)| session.is_active())
            .map(|(session, _)| session.clone())
            .collect())
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(&id).map(|(session, _)| session.clone()))
    }

    async fn insert_session(&self, new: NewSession, span: TimeInterval) -> StoreResult<Session> {
        let mut state = self.state.write().await;
        if state.overlaps(new.mentor_id, &span, None) {
            return Err(StoreError::Conflict {
                mentor_id: new.mentor_id,
            });
        }

        let session = new.into_session(Uuid::new_v4(), Utc::now());
        state.sessions.insert(session.id, (session.clone(), span));
        Ok(session)
    }

    async fn reschedule_session(
        &self,
        id: SessionId,
        change: SessionMove,
        span: TimeInterval,
    ) -> StoreResult<Session> {
        let mut state = self.state.write().await;
        if state.overlaps(change.mentor_id, &span, Some(id)) {
            return Err(StoreError::Conflict {
                mentor_id: change.mentor_id,
            });
        }

        let (session, occupied) = state
            .sessions
            .get_mut(&id)
            .filter(|(session, _)| session.is_active())
            .ok_or_else(|| StoreError::NotFound(format!("Session {}", id)))?;
        change.apply(session);
        *occupied = span;
        Ok(session.clone())
    }

    async fn cancel_session(&self, id: SessionId, cancellation: Cancellation) -> StoreResult<Session> {
        let mut state = self.state.write().await;
        let (session, _) = state
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Session {}", id)))?;
        cancellation.apply(session);
        Ok(session.clone())
    }
}

#[async_trait]
impl IdentityProvider for MemoryStore {
    async fn lookup(&self, token: &str) -> eyre::Result<Option<Caller>> {
        let state = self.state.read().await;
        Ok(state.callers.get(token).cloned())
    }
}
