use chrono::{DateTime, Utc};
use scheddy_core::availability::MentorAvailability;
use scheddy_core::models::{Caller, Mentor, Role, Session, SessionType};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub role: i32,
    pub role_override: i32,
    pub rating: i32,
    pub timezone: Option<String>,
    pub mentor_availability: Option<serde_json::Value>,
    pub allowed_session_types: Option<Vec<String>>,
    pub bookable_session_types: Option<Vec<String>>,
    pub allow_bookings: bool,
    pub created_at: DateTime<Utc>,
}

impl DbUser {
    pub fn role(&self) -> Role {
        Role::effective(self.role, self.role_override)
    }

    /// Parsed availability. A document that does not parse is logged and
    /// treated as absent so one bad row cannot break slot generation.
    pub fn availability(&self) -> Option<MentorAvailability> {
        let value = self.mentor_availability.clone()?;
        match serde_json::from_value(value) {
            Ok(availability) => Some(availability),
            Err(e) => {
                warn!("Ignoring unreadable availability for user {}: {}", self.id, e);
                None
            }
        }
    }

    pub fn into_mentor(self) -> Mentor {
        let availability = self.availability();
        Mentor {
            id: self.id,
            name: self.name,
            rating: self.rating,
            timezone: self.timezone,
            availability,
            bookable_session_types: self.bookable_session_types,
        }
    }

    pub fn into_caller(self) -> Caller {
        Caller {
            id: self.id,
            role: self.role(),
            timezone: self.timezone,
            allowed_session_types: self.allowed_session_types,
            allow_bookings: self.allow_bookings,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSessionType {
    pub id: String,
    pub name: String,
    pub category: String,
    pub length_minutes: i32,
    pub sort_order: i32,
    pub min_rating: i32,
    pub bookable: bool,
}

impl From<DbSessionType> for SessionType {
    fn from(row: DbSessionType) -> Self {
        SessionType {
            id: row.id,
            name: row.name,
            category: row.category,
            length_minutes: u32::try_from(row.length_minutes).unwrap_or_default(),
            order: row.sort_order,
            min_rating: row.min_rating,
            bookable: row.bookable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSession {
    pub id: Uuid,
    pub mentor_id: i64,
    pub student_id: i64,
    pub type_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timezone: String,
    pub cancelled: bool,
    pub cancellation_reason: Option<String>,
    pub cancellation_user_level: Option<i32>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSession> for Session {
    fn from(row: DbSession) -> Self {
        Session {
            id: row.id,
            mentor_id: row.mentor_id,
            student_id: row.student_id,
            type_id: row.type_id,
            start: row.start_time,
            timezone: row.timezone,
            cancelled: row.cancelled,
            cancellation_reason: row.cancellation_reason,
            cancellation_user_level: row.cancellation_user_level,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}
