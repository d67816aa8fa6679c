use axum::{
    extract::{Query, State},
    Json,
};
use scheddy_core::models::{SessionId, SessionTypeId};
use scheddy_core::SlotOverview;
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::{auth::AuthedCaller, error_handling::AppError};
use crate::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    /// Session being moved; its own time stays bookable.
    pub reschedule: Option<SessionId>,
    /// Limits the table to one session type.
    pub session_type: Option<SessionTypeId>,
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn list_slots(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotOverview>, AppError> {
    let mut overview = state
        .arbiter
        .slot_overview(&caller, query.reschedule)
        .await?;

    if let Some(type_id) = &query.session_type {
        overview.table.slots.retain(|id, _| id == type_id);
    }

    Ok(Json(overview))
}
