//! Shopify Admin API access for order tracking.
//!
//! The tracker needs one query (find an order by its tracking tag) and one
//! mutation (tag an order when its reference is issued), so requests are raw
//! GraphQL over `reqwest`. Nothing is cached: every lookup reflects the
//! order's current status.
//!
//! The Admin API token is server-side only. Lookups need `read_orders`;
//! issuing references from the CLI also needs `write_orders`.

mod admin;

pub use admin::AdminClient;

use thiserror::Error;

/// Errors that can occur when talking to the Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status other than 429.
    #[error("Shopify returned HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: reqwest::StatusCode,
        /// Start of the response body.
        body: String,
    },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", join(.0))]
    GraphQL(Vec<GraphQLError>),

    /// Response had neither `data` nor `errors`.
    #[error("GraphQL response carried no data")]
    MissingData,

    /// A mutation was rejected with `userErrors`.
    #[error("Shopify rejected the change: {0}")]
    UserError(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response was well-formed JSON but carried an unusable value.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// A GraphQL error returned by the Admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Dotted response path, e.g. `orders.nodes.0`.
    pub path: Option<String>,
}

impl std::fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} (at {path})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

fn join(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
