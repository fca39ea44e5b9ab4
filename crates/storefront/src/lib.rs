//! Layerline order tracking service library.
//!
//! The binary in `main.rs` wires configuration, Sentry, and the real
//! collaborators; the router and tracker live here so they can be exercised
//! with fakes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
