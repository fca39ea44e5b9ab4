//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Admin API access token (order lookup)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2026-01)
//! - `STOREFRONT_SESSION_SECRET` - Tracking code secret (see below)
//! - `SHOPIFY_STORE_ID` - Numeric store ID (tracking secret fallback)
//! - `STOREFRONT_CLIENT_IP_HEADER` - Proxy-set header holding the client IP,
//!   used as the rate limit key (default: fly-client-ip)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)
//!
//! # Tracking Secret
//!
//! Tracking codes are derived from the first non-empty value of:
//!
//! 1. `STOREFRONT_SESSION_SECRET`
//! 2. `SHOPIFY_STORE_ID`
//! 3. `SHOPIFY_STORE`
//! 4. the built-in [`DEFAULT_TRACKING_SECRET`]
//!
//! Sources 2-4 are not secret, so codes derived from them can be forged by
//! anyone who knows the order ID. The fallbacks keep local development
//! zero-config; startup logs a warning whenever one is used.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderName;
use layerline_core::TrackingSecret;
use secrecy::SecretString;
use thiserror::Error;

use crate::middleware::rate_limit::DEFAULT_CLIENT_IP_HEADER;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Last-resort tracking secret when nothing is configured.
pub const DEFAULT_TRACKING_SECRET: &str = "layerline-order-tracking";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Header the edge proxy writes the client IP into
    pub client_ip_header: HeaderName,
    /// Shopify Admin API configuration
    pub shopify: ShopifyAdminConfig,
    /// Secret used to derive order tracking codes
    pub tracking: TrackingSecretConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced in Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyAdminConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2026-01)
    pub api_version: String,
    /// Admin API access token (server-side only)
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopifyAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAdminConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Where the tracking secret was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// `STOREFRONT_SESSION_SECRET`
    SessionSecret,
    /// `SHOPIFY_STORE_ID`
    StoreId,
    /// `SHOPIFY_STORE`
    StoreDomain,
    /// [`DEFAULT_TRACKING_SECRET`]
    Default,
}

impl SecretSource {
    /// Environment variable this source reads, if any.
    #[must_use]
    pub const fn env_var(self) -> Option<&'static str> {
        match self {
            Self::SessionSecret => Some("STOREFRONT_SESSION_SECRET"),
            Self::StoreId => Some("SHOPIFY_STORE_ID"),
            Self::StoreDomain => Some("SHOPIFY_STORE"),
            Self::Default => None,
        }
    }

    /// Whether this source is a non-secret fallback.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::SessionSecret)
    }
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.env_var().unwrap_or("built-in default"))
    }
}

/// Resolution order for the tracking secret.
const TRACKING_SECRET_CHAIN: [SecretSource; 3] = [
    SecretSource::SessionSecret,
    SecretSource::StoreId,
    SecretSource::StoreDomain,
];

/// Tracking secret plus the source it came from.
#[derive(Debug, Clone)]
pub struct TrackingSecretConfig {
    /// The secret tracking codes are derived from
    pub secret: TrackingSecret,
    /// Where the secret came from
    pub source: SecretSource,
}

impl TrackingSecretConfig {
    /// Resolve the tracking secret from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve the tracking secret using `lookup` to read variables.
    ///
    /// The first source with a non-empty value wins; if none is set the
    /// built-in default is used.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        TRACKING_SECRET_CHAIN
            .iter()
            .find_map(|&source| {
                let value = lookup(source.env_var()?)?;
                (!value.is_empty()).then(|| Self {
                    secret: TrackingSecret::new(value),
                    source,
                })
            })
            .unwrap_or_else(|| Self {
                secret: TrackingSecret::new(DEFAULT_TRACKING_SECRET),
                source: SecretSource::Default,
            })
    }

    /// Log a warning if the secret came from a non-secret fallback.
    pub fn warn_if_fallback(&self) {
        if self.source.is_fallback() {
            tracing::warn!(
                source = %self.source,
                "STOREFRONT_SESSION_SECRET is not set; order tracking codes are derived \
                 from a non-secret fallback and can be forged"
            );
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the Admin API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        let client_ip_header = get_env_or_default(
            "STOREFRONT_CLIENT_IP_HEADER",
            DEFAULT_CLIENT_IP_HEADER,
        );
        let client_ip_header = parse_header_name(&client_ip_header).map_err(|msg| {
            ConfigError::InvalidEnvVar("STOREFRONT_CLIENT_IP_HEADER".to_string(), msg)
        })?;

        let shopify = ShopifyAdminConfig::from_env()?;
        let tracking = TrackingSecretConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            client_ip_header,
            shopify,
            tracking,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyAdminConfig {
    /// Load the Admin API settings on their own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or the access
    /// token fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2026-01"),
            access_token: get_validated_secret("SHOPIFY_ADMIN_ACCESS_TOKEN")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a sample rate in `0.0..=1.0`.
fn parse_header_name(value: &str) -> Result<HeaderName, String> {
    HeaderName::from_bytes(value.trim().as_bytes()).map_err(|e| e.to_string())
}

fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(value) = get_optional_env(key) else {
        return Ok(default);
    };
    parse_rate(&value).map_err(|msg| ConfigError::InvalidEnvVar(key.to_string(), msg))
}

fn parse_rate(value: &str) -> Result<f32, String> {
    let rate = value.parse::<f32>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("must be between 0.0 and 1.0 (got {rate})"))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API tokens have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token Shopify issued."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
