use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers::session_types, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/session-types",
            get(session_types::list_session_types).post(session_types::create_session_type),
        )
        .route(
            "/api/session-types/:id",
            put(session_types::update_session_type),
        )
}
