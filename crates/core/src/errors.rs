use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid availability: {0}")]
    InvalidAvailability(String),

    #[error("The selected slot is no longer available")]
    SlotNoLongerAvailable,

    #[error("Booking limit reached: at most {limit} pending sessions allowed")]
    BookingCapExceeded { limit: u32 },

    #[error("Session type cannot be booked: {0}")]
    IneligibleSessionType(String),

    #[error("Mentor {0} has no timezone configured")]
    MentorTimezoneMissing(i64),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Session can no longer be rescheduled: {0}")]
    RescheduleWindowClosed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Storage error: {0}")]
    Storage(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    /// True for errors that only affect the current request and leave the
    /// generation pass for other mentors and types untouched.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BookingError::Storage(_) | BookingError::Internal(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
