use axum::{
    extract::{Path, State},
    Json,
};
use scheddy_core::availability::MentorAvailability;
use scheddy_core::errors::BookingError;
use scheddy_core::models::UserId;
use std::sync::Arc;

use crate::middleware::{auth::AuthedCaller, error_handling::AppError};
use crate::ApiState;

/// The stored availability template; an empty one if none was ever saved.
#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(_caller): AuthedCaller,
    Path(mentor_id): Path<UserId>,
) -> Result<Json<MentorAvailability>, AppError> {
    let mentor = state
        .store
        .get_mentor(mentor_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Mentor {}", mentor_id)))?;

    Ok(Json(mentor.availability.unwrap_or_default()))
}

#[axum::debug_handler(state = Arc<ApiState>)]
pub async fn update_availability(
    State(state): State<Arc<ApiState>>,
    AuthedCaller(caller): AuthedCaller,
    Path(mentor_id): Path<UserId>,
    Json(availability): Json<MentorAvailability>,
) -> Result<Json<MentorAvailability>, AppError> {
    let saved = state
        .arbiter
        .update_availability(&caller, mentor_id, availability)
        .await?;
    Ok(Json(saved))
}
