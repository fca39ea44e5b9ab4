//! Error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error renders as the
//! tracker's JSON error body (`{"ok": false, "message": ...}`); server errors
//! are captured to Sentry before responding and never leak their details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::tracking::LookupError;

/// Message returned for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// An order or quote lookup failed upstream.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Nothing matched. The message is shown to the shopper.
    #[error("{0}")]
    NotFound(String),

    /// The request was rejected. The message is shown to the shopper.
    #[error("{0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub ok: bool,
    /// Shopper-facing message.
    pub message: String,
}

impl ErrorResponse {
    /// Create an error body with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match self {
            Self::Lookup(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            Self::NotFound(message) | Self::BadRequest(message) => message,
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a shopper action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
