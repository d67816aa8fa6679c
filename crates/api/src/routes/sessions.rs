use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers::sessions, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", post(sessions::book_session))
        .route("/api/sessions", post(sessions::create_session))
        .route(
            "/api/sessions/:id",
            get(sessions::get_session)
                .put(sessions::reschedule_session)
                .patch(sessions::edit_session),
        )
        .route("/api/sessions/:id/cancel", post(sessions::cancel_session))
}
