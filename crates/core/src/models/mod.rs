pub mod session;
pub mod session_type;
pub mod user;

pub use session::{Cancellation, NewSession, Session, SessionId, SessionMove};
pub use session_type::{categorize, SessionCategory, SessionType, SessionTypeDraft, SessionTypeId};
pub use user::{Caller, Mentor, Role, UserId};
