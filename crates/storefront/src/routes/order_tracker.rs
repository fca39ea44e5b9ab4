//! Order tracker endpoint.
//!
//! Shoppers submit the tracking form with a single `reference` field. The
//! answer is always JSON: a match carries `ok: true` and a `kind` tag, and
//! every failure carries `ok: false` with a message safe to show as-is.

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use layerline_core::HELP_MESSAGE;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, ErrorResponse, Result, add_breadcrumb};
use crate::models::{OrderSummary, QuoteSummary};
use crate::services::tracking::LookupResult;
use crate::state::AppState;

/// Message for requests that do not use POST.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str =
    "Method not allowed. Submit the tracking form with POST.";

/// Tracking form body.
#[derive(Debug, Deserialize)]
pub struct TrackerForm {
    /// Free-text reference. A missing field is the same as an empty one.
    #[serde(default)]
    pub reference: String,
}

/// The record a reference matched.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackerMatch {
    ShopifyOrder { order: OrderSummary },
    ServiceQuote { quote: QuoteSummary },
}

/// Successful lookup body.
#[derive(Debug, Serialize)]
pub struct FoundResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub found: TrackerMatch,
}

impl From<TrackerMatch> for FoundResponse {
    fn from(found: TrackerMatch) -> Self {
        Self { ok: true, found }
    }
}

/// Look up an order or service quote by tracking reference.
///
/// # Errors
///
/// - `BadRequest` with the help text if the reference is empty or malformed
/// - `NotFound` echoing the normalized reference if nothing matched
/// - `Lookup` if the order or quote backend failed
#[instrument(skip_all)]
pub async fn lookup(
    State(state): State<AppState>,
    form: std::result::Result<Form<TrackerForm>, FormRejection>,
) -> Result<Json<FoundResponse>> {
    let Form(form) = form.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected tracking form body");
        AppError::BadRequest(HELP_MESSAGE.to_string())
    })?;

    let found = match state.tracker().lookup_raw(&form.reference).await? {
        LookupResult::ShopifyOrderFound(order) => TrackerMatch::ShopifyOrder { order },
        LookupResult::ServiceQuoteFound(quote) => TrackerMatch::ServiceQuote { quote },
        LookupResult::NotFound { reference } => {
            return Err(AppError::NotFound(format!(
                "No order or quote was found for reference {reference}."
            )));
        }
        LookupResult::Invalid(err) => return Err(AppError::BadRequest(err.to_string())),
    };

    let kind = match &found {
        TrackerMatch::ShopifyOrder { .. } => "shopify_order",
        TrackerMatch::ServiceQuote { .. } => "service_quote",
    };
    add_breadcrumb("tracking", "Tracking reference found", &[("kind", kind)]);

    Ok(Json(found.into()))
}

/// Reject anything but POST on the tracker route.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorResponse::new(METHOD_NOT_ALLOWED_MESSAGE)),
    )
}
