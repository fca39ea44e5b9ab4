//! HTTP route handlers for the order tracking service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Order tracking
//! POST /api/order-tracker      - Look up an order or service quote
//! *    /api/order-tracker      - 405 for any other method
//! ```

pub mod order_tracker;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Path of the order tracker endpoint.
pub const ORDER_TRACKER_PATH: &str = "/api/order-tracker";

/// Create the health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Create the order tracker routes.
pub fn tracker_routes() -> Router<AppState> {
    Router::new().route(
        ORDER_TRACKER_PATH,
        post(order_tracker::lookup).fallback(order_tracker::method_not_allowed),
    )
}

/// Create all routes for the service.
pub fn routes() -> Router<AppState> {
    Router::new().merge(health_routes()).merge(tracker_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
