use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use scheddy_core::models::{Session, SessionId, SessionTypeId};
use scheddy_core::slots::SlotKey;
use scheddy_core::{BookingRequest, DirectSession, SessionEdit};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::{auth::AuthedCaller, error_handling::AppError};
use crate::ApiState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub session_type_id: SessionTypeId,
    pub slot: SlotKey,
    pub timezone: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Books a new session from the slot table.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn book_session(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    // Moves go through PUT /api/sessions/:id.
    let request = BookingRequest {
        reschedule: None,
        ..request
    };
    let session = state.arbiter.commit_booking(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn reschedule_session(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Path(id): Path<SessionId>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<Session>, AppError> {
    let request = BookingRequest {
        session_type_id: payload.session_type_id,
        slot: payload.slot,
        timezone: payload.timezone,
        reschedule: Some(id),
    };
    let session = state.arbiter.commit_booking(&caller, request).await?;
    Ok(Json(session))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn cancel_session(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Path(id): Path<SessionId>,
    payload: Option<Json<CancelRequest>>,
) -> Result<Json<Session>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let session = state.arbiter.cancel_session(&caller, id, reason).await?;
    Ok(Json(session))
}

/// Places a session outside the slot table. Mentors and staff only.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn create_session(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Json(request): Json<DirectSession>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let session = state.arbiter.create_direct(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Moves a session to any time, type or mentor. The session's mentor and
/// staff only; reassigning the mentor is staff only.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn edit_session(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Path(id): Path<SessionId>,
    Json(edit): Json<SessionEdit>,
) -> Result<Json<Session>, AppError> {
    let session = state.arbiter.edit_session(&caller, id, edit).await?;
    Ok(Json(session))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn get_session(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Path(id): Path<SessionId>,
) -> Result<Json<Session>, AppError> {
    let session = state.arbiter.session_for(&caller, id).await?;
    Ok(Json(session))
}
