//! Shopify Admin API client implementation.
//!
//! Orders are tagged with their tracking reference when the reference is
//! issued ([`AdminClient::tag_order`]), so the lookup is a tag search. The
//! matched order's ID must re-derive to the same reference; a tag that was
//! typed in by hand or copied to another order does not make that order
//! trackable.

use std::sync::Arc;

use async_trait::async_trait;
use layerline_core::{OrderReference, TrackingSecret, verify_reference};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use super::{GraphQLError, ShopifyError};
use crate::config::ShopifyAdminConfig;
use crate::models::OrderSummary;
use crate::services::tracking::{LookupError, OrderLookup};

const ORDER_BY_TRACKING_REFERENCE: &str = r"
query OrderByTrackingReference($query: String!) {
  orders(first: 1, query: $query) {
    nodes {
      id
      name
      createdAt
      displayFinancialStatus
      displayFulfillmentStatus
      totalPriceSet {
        shopMoney {
          amount
          currencyCode
        }
      }
    }
  }
}
";

const TAG_ORDER: &str = r"
mutation TagOrder($id: ID!, $tags: [String!]!) {
  tagsAdd(id: $id, tags: $tags) {
    node {
      id
    }
    userErrors {
      field
      message
    }
  }
}
";

/// Retry delay assumed when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

impl From<GraphQLErrorResponse> for GraphQLError {
    fn from(e: GraphQLErrorResponse) -> Self {
        let path = (!e.path.is_empty()).then(|| {
            e.path
                .iter()
                .map(|p| p.as_str().map_or_else(|| p.to_string(), str::to_owned))
                .collect::<Vec<_>>()
                .join(".")
        });
        Self {
            message: e.message,
            path,
        }
    }
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, ShopifyError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        self.data.ok_or(ShopifyError::MissingData)
    }
}

#[derive(Debug, Deserialize)]
struct OrdersData {
    orders: OrderNodes,
}

#[derive(Debug, Deserialize)]
struct OrderNodes {
    nodes: Vec<OrderNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderNode {
    id: String,
    name: String,
    created_at: String,
    display_financial_status: Option<String>,
    display_fulfillment_status: String,
    total_price_set: MoneyBag,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyBag {
    shop_money: MoneyV2,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyV2 {
    amount: String,
    currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagsAddData {
    tags_add: Option<TagsAddPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagsAddPayload {
    node: Option<TaggedNode>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct TaggedNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserError {
    field: Option<Vec<String>>,
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Admin API.
///
/// Used by the tracker to look orders up and by the CLI to tag them.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    tracking_secret: TrackingSecret,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Arguments
    ///
    /// * `config` - Shopify Admin API configuration
    /// * `tracking_secret` - Secret tracking references are derived from
    #[must_use]
    pub fn new(config: &ShopifyAdminConfig, tracking_secret: TrackingSecret) -> Self {
        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token: config.access_token.clone(),
                tracking_secret,
            }),
        }
    }

    /// Execute a GraphQL document.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", self.inner.access_token.expose_secret())
            .json(&GraphQLRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;
        check_status(status, retry_after.as_deref(), &response_text)?;

        let response: GraphQLResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Shopify GraphQL response"
            );
            ShopifyError::Parse(e)
        })?;

        response.into_result()
    }

    /// Find the order tagged with `reference`.
    ///
    /// Returns `Ok(None)` if no order carries the tag, or if the tagged order's
    /// ID does not derive to `reference`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if the request fails or the response is invalid.
    #[instrument(skip_all, fields(reference = %reference))]
    pub async fn find_order_by_tracking_reference(
        &self,
        reference: &OrderReference,
    ) -> Result<Option<OrderSummary>, ShopifyError> {
        let data: OrdersData = self
            .execute(
                ORDER_BY_TRACKING_REFERENCE,
                serde_json::json!({ "query": tracking_tag_query(reference) }),
            )
            .await?;

        select_order(&self.inner.tracking_secret, reference, data)
    }

    /// Tag an order with its tracking reference so the tracker can find it.
    ///
    /// Tagging is idempotent on Shopify's side; re-issuing a reference for
    /// the same order is harmless.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::InvalidData` if `reference` was not derived
    /// from `order_id`, `ShopifyError::UserError` if Shopify rejects the tag,
    /// or any other `ShopifyError` if the request fails.
    #[instrument(skip_all, fields(order_id = %order_id, reference = %reference))]
    pub async fn tag_order(
        &self,
        order_id: &str,
        reference: &OrderReference,
    ) -> Result<(), ShopifyError> {
        if !verify_reference(&self.inner.tracking_secret, order_id, reference) {
            return Err(ShopifyError::InvalidData(format!(
                "{reference} was not derived from {order_id}"
            )));
        }

        let data: TagsAddData = self
            .execute(
                TAG_ORDER,
                serde_json::json!({ "id": order_id, "tags": [reference.as_str()] }),
            )
            .await?;

        check_tags_add(order_id, data)?;
        tracing::info!("Order tagged with tracking reference");
        Ok(())
    }
}

#[async_trait]
impl OrderLookup for AdminClient {
    async fn find_by_reference(
        &self,
        reference: &OrderReference,
    ) -> Result<Option<OrderSummary>, LookupError> {
        Ok(self.find_order_by_tracking_reference(reference).await?)
    }
}

/// Admin API search query matching orders tagged with `reference`.
fn tracking_tag_query(reference: &OrderReference) -> String {
    // References are `ord_` + alphanumerics, so no escaping is needed
    format!("tag:'{reference}'")
}

/// Map a non-success HTTP status to an error.
fn check_status(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> Result<(), ShopifyError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let secs = retry_after
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ShopifyError::RateLimited(secs));
    }

    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Shopify Admin API returned non-success status"
        );
        return Err(ShopifyError::Status {
            status,
            body: body.chars().take(200).collect(),
        });
    }

    Ok(())
}

/// Pick the first tagged order, provided its ID derives to `reference`.
fn select_order(
    secret: &TrackingSecret,
    reference: &OrderReference,
    data: OrdersData,
) -> Result<Option<OrderSummary>, ShopifyError> {
    let Some(node) = data.orders.nodes.into_iter().next() else {
        return Ok(None);
    };

    if !verify_reference(secret, &node.id, reference) {
        tracing::warn!(
            order_id = %node.id,
            "Order carries a tracking tag that does not match its ID"
        );
        return Ok(None);
    }

    convert_order(node).map(Some)
}

fn check_tags_add(order_id: &str, data: TagsAddData) -> Result<(), ShopifyError> {
    let Some(payload) = data.tags_add else {
        return Err(ShopifyError::MissingData);
    };

    if !payload.user_errors.is_empty() {
        let messages: Vec<String> = payload
            .user_errors
            .iter()
            .map(|e| {
                let field = e.field.as_ref().map_or_else(String::new, |f| f.join("."));
                format!("{field}: {}", e.message)
            })
            .collect();
        return Err(ShopifyError::UserError(messages.join("; ")));
    }

    match payload.node {
        Some(node) if node.id == order_id => Ok(()),
        Some(node) => Err(ShopifyError::InvalidData(format!(
            "tagged {} instead of {order_id}",
            node.id
        ))),
        None => Err(ShopifyError::InvalidData(format!("no order {order_id}"))),
    }
}

fn convert_order(node: OrderNode) -> Result<OrderSummary, ShopifyError> {
    let money = node.total_price_set.shop_money;
    let total_amount = money.amount.parse::<Decimal>().map_err(|e| {
        ShopifyError::InvalidData(format!("order total '{}': {e}", money.amount))
    })?;

    Ok(OrderSummary {
        id: node.id,
        name: node.name,
        created_at: node.created_at,
        display_financial_status: node.display_financial_status,
        display_fulfillment_status: node.display_fulfillment_status,
        total_amount,
        currency_code: money.currency_code,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use layerline_core::generate_reference;
    use secrecy::SecretString;

    use super::*;

    const ORDER_RESPONSE: &str = r##"{
        "data": {
            "orders": {
                "nodes": [{
                    "id": "gid://shopify/Order/1001",
                    "name": "#1001",
                    "createdAt": "2026-03-01T12:00:00Z",
                    "displayFinancialStatus": "PAID",
                    "displayFulfillmentStatus": "UNFULFILLED",
                    "totalPriceSet": {
                        "shopMoney": { "amount": "42.5", "currencyCode": "USD" }
                    }
                }]
            }
        }
    }"##;

    fn secret() -> TrackingSecret {
        TrackingSecret::new("test-secret")
    }

    fn orders(json: &str) -> OrdersData {
        let response: GraphQLResponse<OrdersData> = serde_json::from_str(json).unwrap();
        response.into_result().unwrap()
    }

    fn reference(order_id: &str) -> OrderReference {
        generate_reference(&secret(), order_id)
    }

    #[test]
    fn test_select_order_with_matching_id() {
        let order = select_order(
            &secret(),
            &reference("gid://shopify/Order/1001"),
            orders(ORDER_RESPONSE),
        )
        .unwrap()
        .unwrap();

        assert_eq!(order.id, "gid://shopify/Order/1001");
        assert_eq!(order.name, "#1001");
        assert_eq!(order.display_financial_status.as_deref(), Some("PAID"));
        assert_eq!(order.display_fulfillment_status, "UNFULFILLED");
        assert_eq!(order.total_amount, Decimal::new(425, 1));
        assert_eq!(order.currency_code, "USD");
    }

    #[test]
    fn test_select_order_rejects_tag_copied_to_another_order() {
        // Order 1001 carries the tag that was issued for order 1002
        let selected = select_order(
            &secret(),
            &reference("gid://shopify/Order/1002"),
            orders(ORDER_RESPONSE),
        )
        .unwrap();

        assert!(selected.is_none());
    }

    #[test]
    fn test_select_order_rejects_tag_under_another_secret() {
        let foreign = generate_reference(&TrackingSecret::new("other"), "gid://shopify/Order/1001");
        let selected = select_order(&secret(), &foreign, orders(ORDER_RESPONSE)).unwrap();

        assert!(selected.is_none());
    }

    #[test]
    fn test_select_order_without_nodes() {
        let data = orders(r#"{ "data": { "orders": { "nodes": [] } } }"#);
        let selected = select_order(&secret(), &reference("gid://shopify/Order/1001"), data);

        assert!(matches!(selected, Ok(None)));
    }

    #[test]
    fn test_select_order_null_financial_status() {
        let json = ORDER_RESPONSE.replace("\"PAID\"", "null");
        let order = select_order(&secret(), &reference("gid://shopify/Order/1001"), orders(&json))
            .unwrap()
            .unwrap();

        assert_eq!(order.display_financial_status, None);
    }

    #[test]
    fn test_select_order_invalid_amount() {
        let json = ORDER_RESPONSE.replace("\"42.5\"", "\"forty-two\"");
        let selected =
            select_order(&secret(), &reference("gid://shopify/Order/1001"), orders(&json));

        assert!(matches!(selected, Err(ShopifyError::InvalidData(_))));
    }

    #[test]
    fn test_rate_limited_uses_retry_after() {
        let err = check_status(StatusCode::TOO_MANY_REQUESTS, Some("30"), "").unwrap_err();
        assert!(matches!(err, ShopifyError::RateLimited(30)));
    }

    #[test]
    fn test_rate_limited_defaults_to_one_second() {
        for retry_after in [None, Some("soon"), Some("")] {
            let err = check_status(StatusCode::TOO_MANY_REQUESTS, retry_after, "").unwrap_err();
            assert!(matches!(err, ShopifyError::RateLimited(1)), "{retry_after:?}");
        }
    }

    #[test]
    fn test_non_success_status_keeps_body_prefix() {
        let body = "x".repeat(300);
        let err = check_status(StatusCode::SERVICE_UNAVAILABLE, None, &body).unwrap_err();

        match err {
            ShopifyError::Status { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body.len(), 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_success_status_passes() {
        assert!(check_status(StatusCode::OK, Some("30"), "{}").is_ok());
    }

    #[test]
    fn test_graphql_errors_keep_their_path() {
        let json = r#"{
            "data": null,
            "errors": [{
                "message": "Access denied for orders field.",
                "locations": [{ "line": 3, "column": 3 }],
                "path": ["orders", 0]
            }]
        }"#;
        let response: GraphQLResponse<OrdersData> = serde_json::from_str(json).unwrap();

        match response.into_result().unwrap_err() {
            ShopifyError::GraphQL(errors) => assert_eq!(
                errors,
                vec![GraphQLError {
                    message: "Access denied for orders field.".to_string(),
                    path: Some("orders.0".to_string()),
                }]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_data_is_an_error() {
        let response: GraphQLResponse<OrdersData> = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response.into_result(),
            Err(ShopifyError::MissingData)
        ));
    }

    fn tags_add(json: &str) -> TagsAddData {
        let response: GraphQLResponse<TagsAddData> = serde_json::from_str(json).unwrap();
        response.into_result().unwrap()
    }

    #[test]
    fn test_tags_add_accepted() {
        let data = tags_add(
            r#"{ "data": { "tagsAdd": {
                "node": { "id": "gid://shopify/Order/1001" },
                "userErrors": []
            } } }"#,
        );
        assert!(check_tags_add("gid://shopify/Order/1001", data).is_ok());
    }

    #[test]
    fn test_tags_add_user_errors() {
        let data = tags_add(
            r#"{ "data": { "tagsAdd": {
                "node": null,
                "userErrors": [{ "field": ["id"], "message": "Order does not exist" }]
            } } }"#,
        );

        match check_tags_add("gid://shopify/Order/404", data) {
            Err(ShopifyError::UserError(message)) => {
                assert_eq!(message, "id: Order does not exist");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_tags_add_without_node() {
        let data = tags_add(r#"{ "data": { "tagsAdd": { "node": null, "userErrors": [] } } }"#);
        assert!(matches!(
            check_tags_add("gid://shopify/Order/1001", data),
            Err(ShopifyError::InvalidData(_))
        ));
    }

    #[test]
    fn test_tracking_tag_query() {
        let reference = OrderReference::parse("ord_AbCdEfGh12345678").unwrap();
        assert_eq!(tracking_tag_query(&reference), "tag:'ord_AbCdEfGh12345678'");
    }

    #[tokio::test]
    async fn test_tag_order_refuses_foreign_reference() {
        let config = ShopifyAdminConfig {
            store: "layerline.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            access_token: SecretString::from("shpat_test"),
        };
        let client = AdminClient::new(&config, secret());

        // Fails before any request is sent
        let err = client
            .tag_order("gid://shopify/Order/1001", &reference("gid://shopify/Order/1002"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopifyError::InvalidData(_)));
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = ShopifyAdminConfig {
            store: "layerline.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            access_token: SecretString::from("shpat_test"),
        };
        let client = AdminClient::new(&config, secret());

        assert_eq!(
            client.inner.endpoint,
            "https://layerline.myshopify.com/admin/api/2026-01/graphql.json"
        );
    }
}
