//! Layerline Core - Tracking reference types.
//!
//! This crate provides the types shared by every Layerline component:
//! - `storefront` - Public order tracking endpoint
//! - `cli` - Command-line tools for migrations and reference management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Secrets are passed in explicitly by the caller.
//!
//! # Modules
//!
//! - [`types`] - Tracking reference classification and tracking code derivation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
