//! Order tracker lookup dispatcher.
//!
//! Classifies a shopper's reference and routes it to exactly one collaborator:
//!
//! ```text
//! raw input ──classify──┬── Invalid ───────────────────────────► LookupResult::Invalid
//!                       ├── ord_… ──► OrderLookup::find_by_reference ──► ShopifyOrderFound / NotFound
//!                       └── COT-… ──► QuoteLookup::find_by_order_id ───► ServiceQuoteFound / NotFound
//! ```
//!
//! Each call makes at most one collaborator request. There are no retries and
//! no caching; collaborator errors are returned as-is.

mod error;

pub use error::LookupError;

use std::sync::Arc;

use async_trait::async_trait;
use layerline_core::{OrderReference, ReferenceError, TrackingReference};
use tracing::instrument;

use crate::models::{OrderSummary, QuoteSummary};

/// Looks up Shopify orders by tracking reference.
#[async_trait]
pub trait OrderLookup: Send + Sync {
    /// Find the order issued `reference`, if any.
    async fn find_by_reference(
        &self,
        reference: &OrderReference,
    ) -> Result<Option<OrderSummary>, LookupError>;
}

/// Looks up service quotes by external order ID.
#[async_trait]
pub trait QuoteLookup: Send + Sync {
    /// Find the quote with external order ID `order_id`, if any.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<QuoteSummary>, LookupError>;
}

/// Outcome of a tracking lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    /// The reference matched a Shopify order.
    ShopifyOrderFound(OrderSummary),
    /// The reference matched a service quote.
    ServiceQuoteFound(QuoteSummary),
    /// The reference is well-formed but nothing matched.
    NotFound {
        /// The normalized reference that was looked up.
        reference: TrackingReference,
    },
    /// The input is not a valid reference.
    Invalid(ReferenceError),
}

/// Dispatches tracking lookups to the order and quote collaborators.
///
/// Cheap to clone; collaborators are shared via `Arc`.
#[derive(Clone)]
pub struct OrderTracker {
    orders: Arc<dyn OrderLookup>,
    quotes: Arc<dyn QuoteLookup>,
}

impl OrderTracker {
    /// Create a tracker over the given collaborators.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderLookup>, quotes: Arc<dyn QuoteLookup>) -> Self {
        Self { orders, quotes }
    }

    /// Classify raw shopper input and look it up.
    ///
    /// Invalid input returns [`LookupResult::Invalid`] without calling any
    /// collaborator.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the collaborator fails.
    pub async fn lookup_raw(&self, raw: &str) -> Result<LookupResult, LookupError> {
        match TrackingReference::classify(raw) {
            Ok(reference) => self.lookup(reference).await,
            Err(err) => {
                tracing::debug!(normalized = %err.normalized(), "Rejected tracking reference");
                Ok(LookupResult::Invalid(err))
            }
        }
    }

    /// Look up a classified reference.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the collaborator fails.
    #[instrument(skip_all, fields(kind = reference.kind(), reference = %reference))]
    pub async fn lookup(&self, reference: TrackingReference) -> Result<LookupResult, LookupError> {
        let found = match &reference {
            TrackingReference::Quote(quote) => self
                .quotes
                .find_by_order_id(quote.as_str())
                .await?
                .map(LookupResult::ServiceQuoteFound),
            TrackingReference::Order(order) => self
                .orders
                .find_by_reference(order)
                .await?
                .map(LookupResult::ShopifyOrderFound),
        };

        match found {
            Some(result) => {
                tracing::info!("Tracking reference found");
                Ok(result)
            }
            None => {
                tracing::debug!("Tracking reference not found");
                Ok(LookupResult::NotFound { reference })
            }
        }
    }
}
