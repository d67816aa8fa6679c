use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BookingResult;
use crate::interval::TimeInterval;
use crate::models::session_type::SessionTypeId;
use crate::models::user::UserId;

pub type SessionId = Uuid;

/// A booked mentoring session. Cancelled sessions are kept, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub mentor_id: UserId,
    pub student_id: UserId,
    pub type_id: SessionTypeId,
    pub start: DateTime<Utc>,
    /// Zone the student booked in; display only.
    pub timezone: String,
    pub cancelled: bool,
    pub cancellation_reason: Option<String>,
    pub cancellation_user_level: Option<i32>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn span(&self, length_minutes: u32) -> BookingResult<TimeInterval> {
        TimeInterval::starting_at(self.start, i64::from(length_minutes))
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled
    }

    /// Counts toward a student's pending-session cap.
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        !self.cancelled && self.start > now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub mentor_id: UserId,
    pub student_id: UserId,
    pub type_id: SessionTypeId,
    pub start: DateTime<Utc>,
    pub timezone: String,
    pub created_by: Option<UserId>,
}

impl NewSession {
    pub fn into_session(self, id: SessionId, created_at: DateTime<Utc>) -> Session {
        Session {
            id,
            mentor_id: self.mentor_id,
            student_id: self.student_id,
            type_id: self.type_id,
            start: self.start,
            timezone: self.timezone,
            cancelled: false,
            cancellation_reason: None,
            cancellation_user_level: None,
            created_by: self.created_by,
            created_at,
        }
    }
}

/// New time, mentor and type for an existing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMove {
    pub mentor_id: UserId,
    pub type_id: SessionTypeId,
    pub start: DateTime<Utc>,
    pub timezone: String,
}

impl SessionMove {
    pub fn apply(self, session: &mut Session) {
        session.mentor_id = self.mentor_id;
        session.type_id = self.type_id;
        session.start = self.start;
        session.timezone = self.timezone;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub reason: Option<String>,
    /// Role level of whoever cancelled.
    pub user_level: i32,
}

impl Cancellation {
    pub fn apply(self, session: &mut Session) {
        session.cancelled = true;
        session.cancellation_reason = self.reason;
        session.cancellation_user_level = Some(self.user_level);
    }
}
