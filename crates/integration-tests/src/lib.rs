//! Live-server integration tests for the Layerline order tracker.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p layerline-cli -- migrate
//!
//! # Start the storefront in another terminal
//! cargo run -p layerline-storefront
//!
//! # Run the ignored live tests
//! cargo test -p layerline-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - server under test (default `http://localhost:3000`)
//! - `STOREFRONT_DATABASE_URL` - used to seed service quotes
//!
//! The server under test must key its rate limiter on the default
//! `fly-client-ip` header, which these tests set directly.

use std::net::Ipv4Addr;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Order tracker path on the server under test.
pub const ORDER_TRACKER_PATH: &str = "/api/order-tracker";

/// Shared state for one live test.
pub struct TestContext {
    /// HTTP client.
    pub client: Client,
    /// Base URL without a trailing slash.
    pub base_url: String,
    /// Client IP sent as `Fly-Client-IP`, unique per context so tests do
    /// not share a rate limit bucket.
    pub client_ip: Ipv4Addr,
}

impl TestContext {
    /// Create a context from the environment.
    #[must_use]
    pub fn new() -> Self {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("STOREFRONT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let [.., a, b] = *Uuid::new_v4().as_bytes();

        Self {
            client: Client::new(),
            base_url,
            client_ip: Ipv4Addr::new(10, 77, a, b),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Submit the tracking form and return the status and JSON body.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the request fails.
    pub async fn track(&self, reference: &str) -> reqwest::Result<(StatusCode, Value)> {
        let response = self
            .client
            .post(self.url(ORDER_TRACKER_PATH))
            .header("fly-client-ip", self.client_ip.to_string())
            .form(&[("reference", reference)])
            .send()
            .await?;

        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// Connect to the storefront database, if configured.
    pub async fn pool(&self) -> Option<PgPool> {
        let url = std::env::var("STOREFRONT_DATABASE_URL").ok()?;
        PgPool::connect(&url).await.ok()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert a service quote and return its `COT-` order ID.
///
/// # Errors
///
/// Returns `sqlx::Error` if the insert fails.
pub async fn seed_quote(pool: &PgPool, status: &str) -> Result<String, sqlx::Error> {
    let order_id = format!("COT-IT{}", Uuid::new_v4().simple()).to_uppercase();

    sqlx::query(
        r"
        INSERT INTO storefront.service_quote (order_id, service_mode, status)
        VALUES ($1, $2, $3)
        ",
    )
    .bind(&order_id)
    .bind("print_only")
    .bind(status)
    .execute(pool)
    .await?;

    Ok(order_id)
}

/// Remove a quote created by [`seed_quote`].
///
/// # Errors
///
/// Returns `sqlx::Error` if the delete fails.
pub async fn remove_quote(pool: &PgPool, order_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM storefront.service_quote WHERE order_id = $1")
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}
