//! Core types for Layerline.
//!
//! This module provides type-safe wrappers for tracking references.

pub mod reference;
pub mod tracking_code;

pub use reference::{
    HELP_MESSAGE, OrderReference, QuoteReference, ReferenceError, TrackingReference,
};
pub use tracking_code::{
    TrackingCode, TrackingCodeError, TrackingSecret, generate_reference, verify_reference,
};
