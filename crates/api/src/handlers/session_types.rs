use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use scheddy_core::models::{categorize, Role, SessionCategory, SessionType, SessionTypeDraft, SessionTypeId};
use scheddy_core::slots::eligible_session_types;
use std::sync::Arc;
use tracing::info;

use crate::middleware::{auth::AuthedCaller, error_handling::AppError};
use crate::ApiState;

/// Bookable types the caller may book, grouped by category.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn list_session_types(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
) -> Result<Json<Vec<SessionCategory>>, AppError> {
    let types = state.store.list_session_types().await?;
    let eligible: Vec<SessionType> = eligible_session_types(&caller, &types)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(categorize(&eligible)))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn create_session_type(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Json(draft): Json<SessionTypeDraft>,
) -> Result<(StatusCode, Json<SessionType>), AppError> {
    caller.require(Role::Staff)?;
    draft.validate()?;

    let session_type = state.store.create_session_type(draft).await?;
    info!("Session type {} created by {}", session_type.id, caller.id);
    Ok((StatusCode::CREATED, Json(session_type)))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn update_session_type(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Path(id): Path<SessionTypeId>,
    Json(draft): Json<SessionTypeDraft>,
) -> Result<Json<SessionType>, AppError> {
    caller.require(Role::Staff)?;
    draft.validate()?;

    let session_type = state.store.update_session_type(&id, draft).await?;
    info!("Session type {} updated by {}", session_type.id, caller.id);
    Ok(Json(session_type))
}
