#[path = "../test_utils.rs"]
mod test_utils;

mod health_test;
mod mentors_test;
mod session_types_test;
mod sessions_test;
mod slots_test;
