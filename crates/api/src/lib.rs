//! # Scheddy API
//!
//! HTTP surface of the Scheddy booking engine. Students browse open slots and
//! book, reschedule or cancel sessions; mentors maintain their availability
//! and place sessions directly; staff manage session types.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate requests into calls on the [`BookingArbiter`]
//! - **Middleware**: Bearer-token authentication and error mapping
//! - **Config**: Environment and booking-rule configuration
//!
//! Storage and identity sit behind the traits in `scheddy_core::store`, so the
//! same router runs against Postgres in production and an in-memory store in
//! tests.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use eyre::Result;
use scheddy_core::store::{BookingStore, IdentityProvider};
use scheddy_core::BookingArbiter;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// Read access for listings that do not go through the arbiter
    pub store: Arc<dyn BookingStore>,
    /// Resolves bearer tokens to callers
    pub identity: Arc<dyn IdentityProvider>,
    /// Every write that touches sessions or availability goes through here
    pub arbiter: Arc<BookingArbiter>,
}

/// Builds the application router with all routes attached to `state`.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Slot listing
        .merge(routes::slots::routes())
        // Booking, rescheduling and cancellation
        .merge(routes::sessions::routes())
        // Session type management
        .merge(routes::session_types::routes())
        // Mentor availability
        .merge(routes::mentors::routes())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true)
}

/// Starts the API server with the provided configuration and state
///
/// # Example
///
/// ```ignore
/// let config = ApiConfig::from_env()?;
/// let state = Arc::new(ApiState { store, identity, arbiter });
/// start_server(config, state).await?;
/// ```
pub async fn start_server(config: config::ApiConfig, state: Arc<ApiState>) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app = build_router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    // Request tracing and timeout middleware
    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
