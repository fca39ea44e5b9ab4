//! Order tracker tests against a running server.
//!
//! All tests are ignored by default; see the crate docs for setup.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use layerline_core::HELP_MESSAGE;
use layerline_integration_tests::{ORDER_TRACKER_PATH, TestContext, remove_quote, seed_quote};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_health() {
    let ctx = TestContext::new();
    let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_get_is_rejected() {
    let ctx = TestContext::new();
    let resp = ctx
        .client
        .get(ctx.url(ORDER_TRACKER_PATH))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_invalid_reference() {
    let ctx = TestContext::new();
    let (status, body) = ctx.track("   ").await.unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], HELP_MESSAGE);
}

#[tokio::test]
#[ignore = "requires a running storefront and Shopify credentials"]
async fn test_unknown_order_reference() {
    let ctx = TestContext::new();
    let (status, body) = ctx.track("ORD_zzzzzzzzzzzzzzzz").await.unwrap();

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "No order or quote was found for reference ord_zzzzzzzzzzzzzzzz."
    );
}

#[tokio::test]
#[ignore = "requires a running storefront and database"]
async fn test_seeded_quote_is_found() {
    let ctx = TestContext::new();
    let pool = ctx.pool().await.expect("STOREFRONT_DATABASE_URL must be set");
    let order_id = seed_quote(&pool, "in_review").await.unwrap();

    let (status, body) = ctx.track(&order_id.to_lowercase()).await.unwrap();
    remove_quote(&pool, &order_id).await.unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "service_quote");
    assert_eq!(body["quote"]["orderId"], order_id.as_str());
    assert_eq!(body["quote"]["status"], "in_review");
}

#[tokio::test]
#[ignore = "requires a running storefront"]
async fn test_lookups_are_rate_limited() {
    let ctx = TestContext::new();

    let mut statuses = Vec::new();
    for _ in 0..10 {
        let (status, _) = ctx.track("ab").await.unwrap();
        statuses.push(status);
    }

    assert_eq!(statuses[0], StatusCode::BAD_REQUEST);
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}
