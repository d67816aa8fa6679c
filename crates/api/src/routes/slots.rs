use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{handlers::slots, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route("/api/slots", get(slots::list_slots))
}
