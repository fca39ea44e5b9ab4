//! Domain models for storefront.

pub mod tracking;

pub use tracking::{OrderSummary, QuoteSummary};
