pub mod mentors;
pub mod session_types;
pub mod sessions;
pub mod slots;
