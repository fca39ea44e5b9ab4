//! Order tracking error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::shopify::ShopifyError;

/// Errors raised by a lookup collaborator.
///
/// The tracker does not retry or recover; these surface as server errors.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Shopify Admin API order lookup failed.
    #[error("order lookup failed: {0}")]
    Shopify(#[from] ShopifyError),

    /// Service quote lookup failed.
    #[error("quote lookup failed: {0}")]
    Repository(#[from] RepositoryError),
}
