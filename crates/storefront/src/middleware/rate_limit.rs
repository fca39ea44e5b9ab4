//! Rate limiting for the order tracker using governor and `tower_governor`.
//!
//! Tracking codes are 16 characters over a 62-letter alphabet, but a lookup
//! endpoint without a limit still invites enumeration. Lookups are keyed by
//! client IP.
//!
//! # Trust
//!
//! The key comes from exactly one header, `STOREFRONT_CLIENT_IP_HEADER`
//! (default `fly-client-ip`), which the edge proxy sets on every request and
//! overwrites when the client sends its own. Client-controlled headers such as
//! `X-Forwarded-For` are never read: a fresh value per request would give the
//! caller a fresh bucket. This only holds while the service is reachable
//! through that proxy alone. Without the header the socket peer address is
//! used, so a directly exposed instance still limits per connection address.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Header the Fly.io edge sets to the connecting client's address.
pub const DEFAULT_CLIENT_IP_HEADER: &str = "fly-client-ip";

/// Key extractor that reads the client IP from the trusted proxy header.
///
/// Falls back to the socket peer address, which requires serving with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Debug, Clone)]
pub struct ClientIpKeyExtractor {
    header: HeaderName,
}

impl ClientIpKeyExtractor {
    /// Key on the address in `header`.
    #[must_use]
    pub const fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers(), &self.header)
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// The single address in `header`, if present and well-formed.
fn client_ip(headers: &HeaderMap, header: &HeaderName) -> Option<IpAddr> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the tracker rate limiter: ~10 lookups per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. `per_second(6)` and `burst_size(5)` are
/// always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn tracker_rate_limiter(client_ip_header: HeaderName) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(client_ip_header))
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn fly() -> HeaderName {
        HeaderName::from_static(DEFAULT_CLIENT_IP_HEADER)
    }

    fn request(pairs: &[(&'static str, &'static str)]) -> Request<()> {
        let mut req = Request::new(());
        for (name, value) in pairs {
            req.headers_mut().insert(*name, HeaderValue::from_static(*value));
        }
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 50123))));
        req
    }

    fn key(extractor: &ClientIpKeyExtractor, req: &Request<()>) -> IpAddr {
        extractor.extract(req).unwrap()
    }

    #[test]
    fn test_trusted_header_is_used() {
        let extractor = ClientIpKeyExtractor::new(fly());
        let req = request(&[("fly-client-ip", "203.0.113.7")]);
        assert_eq!(key(&extractor, &req), "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_forwarded_for_cannot_pick_the_bucket() {
        let extractor = ClientIpKeyExtractor::new(fly());
        let peer: IpAddr = "127.0.0.1".parse().unwrap();

        for spoofed in ["198.51.100.2", "198.51.100.3"] {
            let req = request(&[
                ("x-forwarded-for", spoofed),
                ("cf-connecting-ip", "192.0.2.1"),
                ("x-real-ip", "192.0.2.2"),
            ]);
            assert_eq!(key(&extractor, &req), peer);
        }
    }

    #[test]
    fn test_configured_header() {
        let extractor = ClientIpKeyExtractor::new(HeaderName::from_static("cf-connecting-ip"));
        let req = request(&[
            ("cf-connecting-ip", "2001:db8::1"),
            ("fly-client-ip", "192.0.2.9"),
        ]);
        assert_eq!(key(&extractor, &req), "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_malformed_header_falls_back_to_peer() {
        let extractor = ClientIpKeyExtractor::new(fly());
        for value in ["unknown", "198.51.100.2, 10.0.0.1"] {
            let req = request(&[("fly-client-ip", value)]);
            assert_eq!(key(&extractor, &req), "127.0.0.1".parse::<IpAddr>().unwrap());
        }
    }

    #[test]
    fn test_no_header_and_no_peer() {
        let extractor = ClientIpKeyExtractor::new(fly());
        assert!(extractor.extract(&Request::new(())).is_err());
    }

    #[test]
    fn test_tracker_rate_limiter_builds() {
        let _layer = tracker_rate_limiter(fly());
    }
}
