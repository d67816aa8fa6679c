pub mod session;
pub mod session_type;
pub mod user;
