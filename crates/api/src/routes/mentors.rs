use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{handlers::mentors, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route(
        "/api/mentors/:id/availability",
        get(mentors::get_availability).put(mentors::update_availability),
    )
}
