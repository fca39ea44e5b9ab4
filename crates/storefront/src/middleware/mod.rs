//! HTTP middleware stack for the order tracking service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, one hub per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (nosniff, frame deny, no-store)
//! 5. Rate limiting (governor, tracker route only)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use rate_limit::tracker_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
