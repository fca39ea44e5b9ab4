//! Business logic services.
//!
//! - [`tracking`] - Order tracker lookup dispatcher

pub mod tracking;

pub use tracking::{LookupError, LookupResult, OrderLookup, OrderTracker, QuoteLookup};
