use async_trait::async_trait;
use mockall::mock;
use scheddy_core::availability::MentorAvailability;
use scheddy_core::interval::TimeInterval;
use scheddy_core::models::{
    Caller, Cancellation, Mentor, NewSession, Session, SessionId, SessionMove, SessionType,
    SessionTypeDraft, SessionTypeId, UserId,
};
use scheddy_core::store::{
    BookingStore, IdentityProvider, Notifier, SessionEvent, StoreResult,
};

// Mock collaborators for testing
mock! {
    pub Store {}

    #[async_trait]
    impl BookingStore for Store {
        async fn list_session_types(&self) -> StoreResult<Vec<SessionType>>;

        async fn create_session_type(&self, draft: SessionTypeDraft) -> StoreResult<SessionType>;

        async fn update_session_type(
            &self,
            id: &SessionTypeId,
            draft: SessionTypeDraft,
        ) -> StoreResult<SessionType>;

        async fn list_mentors(&self) -> StoreResult<Vec<Mentor>>;

        async fn get_mentor(&self, id: UserId) -> StoreResult<Option<Mentor>>;

        async fn save_mentor_availability(
            &self,
            id: UserId,
            availability: &MentorAvailability,
        ) -> StoreResult<()>;

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
}

mock! {
    pub Identity {}

    #[async_trait]
    impl IdentityProvider for Identity {
        async fn lookup(&self, token: &str) -> eyre::Result<Option<Caller>>;
    }
}

mock! {
    pub Notify {}

    #[async_trait]
    impl Notifier for Notify {
        async fn notify(&self, event: &SessionEvent) -> eyre::Result<()>;
    }
}
