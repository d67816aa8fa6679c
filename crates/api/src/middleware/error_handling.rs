//! # Error Handling Middleware
//!
//! Maps [`BookingError`] to HTTP status codes and a JSON body of the form
//! `{ "error": "<message>" }`, so every handler reports failures the same way.
//!
//! Expected failures a client can act on (a slot taken in the meantime, the
//! booking cap, a closed reschedule window) map to `409 Conflict`. Storage and
//! internal failures are logged and surface as `500`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scheddy_core::errors::BookingError;
use scheddy_core::store::StoreError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use scheddy_api::middleware::error_handling::AppError;
/// use scheddy_core::errors::BookingError;
///
/// async fn handler(found: bool) -> Result<Json<&'static str>, AppError> {
///     if !found {
///         return Err(BookingError::NotFound("Session".to_string()).into());
///     }
///     Ok(Json("ok"))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Validation(_) | BookingError::InvalidTimezone(_) => {
                StatusCode::BAD_REQUEST
            }
            BookingError::Authentication(_) => StatusCode::UNAUTHORIZED,
            BookingError::Authorization(_) | BookingError::IneligibleSessionType(_) => {
                StatusCode::FORBIDDEN
            }
            BookingError::SlotNoLongerAvailable
            | BookingError::BookingCapExceeded { .. }
            | BookingError::RescheduleWindowClosed(_) => StatusCode::CONFLICT,
            BookingError::InvalidAvailability(_) | BookingError::MentorTimezoneMissing(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BookingError::Storage(_) | BookingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {:?}", self.0);
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError(err.into())
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Storage(err))
    }
}

/// Maps a BookingError to an HTTP response
pub fn map_error(err: BookingError) -> Response {
    AppError(err).into_response()
}
