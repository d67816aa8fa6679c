//! # Authentication Module
//!
//! Callers authenticate with an opaque session token sent as
//! `Authorization: Bearer <token>`. The token is resolved through the
//! [`IdentityProvider`](scheddy_core::store::IdentityProvider) held in
//! [`ApiState`]; handlers receive the resulting [`Caller`] through the
//! [`AuthedCaller`] extractor.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use scheddy_core::errors::BookingError;
use scheddy_core::models::Caller;
use tracing::debug;

use crate::middleware::error_handling::AppError;
use crate::ApiState;

/// The authenticated caller of a request.
///
/// # Example
///
/// ```ignore
/// async fn whoami(AuthedCaller(caller): AuthedCaller) -> String {
///     caller.id.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthedCaller(pub Caller);

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthedCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| {
                BookingError::Authentication("Missing bearer token".to_string())
            })?;

        match state.identity.lookup(token).await? {
            Some(caller) => Ok(AuthedCaller(caller)),
            None => {
                debug!("Rejected unknown or expired token");
                Err(BookingError::Authentication("Invalid or expired token".to_string()).into())
            }
        }
    }
}
