//! Tracking reference commands.
//!
//! # Usage
//!
//! ```bash
//! # Print the reference for an order (offline)
//! layerline tracking generate --order-id gid://shopify/Order/1001
//!
//! # Issue the reference: tag the order in Shopify so the tracker finds it
//! layerline tracking issue --order-id gid://shopify/Order/1001
//!
//! # Check a reference a shopper was given (exits non-zero on mismatch)
//! layerline tracking verify --order-id gid://shopify/Order/1001 --reference ord_XXXXXXXXXXXXXXXX
//!
//! # Show how the tracker would read some input
//! layerline tracking classify " cot-123 "
//! ```
//!
//! The secret is resolved with the same chain as the server
//! (`STOREFRONT_SESSION_SECRET`, `SHOPIFY_STORE_ID`, `SHOPIFY_STORE`, then the
//! built-in default), so generated references match what the tracker accepts.
//! `issue` also needs `SHOPIFY_STORE` and a `SHOPIFY_ADMIN_ACCESS_TOKEN` with
//! the `write_orders` scope.

use layerline_core::{
    OrderReference, ReferenceError, TrackingReference, generate_reference, verify_reference,
};
use layerline_storefront::config::{ConfigError, ShopifyAdminConfig, TrackingSecretConfig};
use layerline_storefront::shopify::{AdminClient, ShopifyError};
use thiserror::Error;

/// Errors that can occur in tracking commands.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The order ID was empty.
    #[error("Order ID must not be empty")]
    EmptyOrderId,

    /// The input is not a tracking reference.
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    /// The input is a quote reference, which has no derived code.
    #[error("{0} is a service quote reference, not an order reference")]
    NotAnOrderReference(String),

    /// The reference was not issued for the order.
    #[error("{reference} was not issued for {order_id}")]
    Mismatch {
        /// Order ID that was checked.
        order_id: String,
        /// Normalized reference that was checked.
        reference: String,
    },

    /// Admin API settings are missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The order could not be tagged.
    #[error("Failed to tag order: {0}")]
    Shopify(#[from] ShopifyError),
}

fn resolve_secret() -> TrackingSecretConfig {
    dotenvy::dotenv().ok();
    let config = TrackingSecretConfig::from_env();
    config.warn_if_fallback();
    config
}

/// Print the tracking reference for an order.
///
/// # Errors
///
/// Returns `TrackingError::EmptyOrderId` if `order_id` is blank.
pub fn generate(order_id: &str) -> Result<(), TrackingError> {
    let config = resolve_secret();
    let reference = reference_for(&config, order_id)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{reference}");
        println!("secret source: {}", config.source);
    }
    Ok(())
}

/// Issue the tracking reference for an order by tagging it in Shopify.
///
/// # Errors
///
/// Returns `TrackingError` if `order_id` is blank, the Admin API is not
/// configured, or Shopify rejects the tag.
pub async fn issue(order_id: &str) -> Result<(), TrackingError> {
    let config = resolve_secret();
    let reference = reference_for(&config, order_id)?;
    let order_id = order_id.trim();

    let shopify = ShopifyAdminConfig::from_env()?;
    let client = AdminClient::new(&shopify, config.secret.clone());
    client.tag_order(order_id, &reference).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{reference}");
        println!("tagged {order_id}");
    }
    Ok(())
}

/// Check that `reference` was issued for `order_id`.
///
/// # Errors
///
/// Returns `TrackingError` if the reference is malformed, is not an order
/// reference, or does not match.
pub fn verify(order_id: &str, reference: &str) -> Result<(), TrackingError> {
    let config = resolve_secret();
    let reference = check(&config, order_id, reference)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{reference} matches {order_id}");
    }
    Ok(())
}

/// Print the normalized form and kind of `raw`.
///
/// # Errors
///
/// Returns `TrackingError::InvalidReference` (whose message is the shopper
/// help text) if the input is not a reference.
pub fn classify(raw: &str) -> Result<(), TrackingError> {
    let reference = TrackingReference::classify(raw)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}\t{}", reference.kind(), reference);
    }
    Ok(())
}

fn reference_for(
    config: &TrackingSecretConfig,
    order_id: &str,
) -> Result<OrderReference, TrackingError> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(TrackingError::EmptyOrderId);
    }
    Ok(generate_reference(&config.secret, order_id))
}

fn check(
    config: &TrackingSecretConfig,
    order_id: &str,
    raw: &str,
) -> Result<OrderReference, TrackingError> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(TrackingError::EmptyOrderId);
    }

    let reference = match TrackingReference::classify(raw)? {
        TrackingReference::Order(reference) => reference,
        TrackingReference::Quote(quote) => {
            return Err(TrackingError::NotAnOrderReference(quote.into_inner()));
        }
    };

    if verify_reference(&config.secret, order_id, &reference) {
        Ok(reference)
    } else {
        Err(TrackingError::Mismatch {
            order_id: order_id.to_owned(),
            reference: reference.into_inner(),
        })
    }
}
