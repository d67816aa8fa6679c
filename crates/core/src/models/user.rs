use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::availability::MentorAvailability;
use crate::errors::{BookingError, BookingResult};
use crate::models::session_type::{SessionType, SessionTypeId};

pub type UserId = i64;

/// Permission ladder. Each role includes everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Student,
    Mentor,
    Staff,
    Developer,
}

impl Role {
    pub fn from_level(level: i32) -> Self {
        match level {
            l if l >= 40 => Role::Developer,
            l if l >= 30 => Role::Staff,
            l if l >= 20 => Role::Mentor,
            l if l >= 10 => Role::Student,
            _ => Role::Member,
        }
    }

    /// The stored role, raised by a manual override when one is higher.
    pub fn effective(role: i32, role_override: i32) -> Self {
        Self::from_level(role.max(role_override))
    }

    pub fn level(&self) -> i32 {
        match self {
            Role::Member => 0,
            Role::Student => 10,
            Role::Mentor => 20,
            Role::Staff => 30,
            Role::Developer => 40,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Member => "Member",
            Role::Student => "Student",
            Role::Mentor => "Training Staff",
            Role::Staff => "Facility Staff",
            Role::Developer => "Developer",
        }
    }
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
    pub timezone: Option<String>,
    /// `None` allows every session type.
    pub allowed_session_types: Option<Vec<SessionTypeId>>,
    pub allow_bookings: bool,
}

impl Caller {
    pub fn may_book(&self, session_type: &SessionType) -> bool {
        match &self.allowed_session_types {
            None => true,
            Some(allowed) => allowed.iter().any(|id| *id == session_type.id),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role >= Role::Staff
    }

    pub fn is_mentor(&self) -> bool {
        self.role >= Role::Mentor
    }

    pub fn require(&self, role: Role) -> BookingResult<()> {
        if self.role >= role {
            Ok(())
        } else {
            Err(BookingError::Authorization(format!(
                "{} access required",
                role.display_name()
            )))
        }
    }
}

/// Mentor-facing projection of a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mentor {
    pub id: UserId,
    pub name: String,
    pub rating: i32,
    pub timezone: Option<String>,
    pub availability: Option<MentorAvailability>,
    /// `None` offers every session type.
    pub bookable_session_types: Option<Vec<SessionTypeId>>,
}

impl Mentor {
    pub fn tz(&self) -> BookingResult<Tz> {
        let name = self
            .timezone
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or(BookingError::MentorTimezoneMissing(self.id))?;
        name.parse::<Tz>()
            .map_err(|_| BookingError::InvalidTimezone(name.to_string()))
    }

    /// Whether this mentor may run sessions of `session_type`.
    pub fn offers(&self, session_type: &SessionType) -> bool {
        let listed = match &self.bookable_session_types {
            None => true,
            Some(types) => types.iter().any(|id| *id == session_type.id),
        };
        listed && self.rating >= session_type.min_rating
    }
}
