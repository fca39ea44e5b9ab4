//! Order tracking domain types.
//!
//! These are the summaries returned to the shopper, so field names serialize
//! in camelCase to match the tracker widget's JSON contract.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Summary of a Shopify order, as shown by the order tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// Shopify order GID (e.g., `gid://shopify/Order/1001`).
    pub id: String,
    /// Order name (e.g., "#1001").
    pub name: String,
    /// Creation timestamp (ISO 8601, as returned by Shopify).
    pub created_at: String,
    /// Financial status (e.g., "PAID").
    pub display_financial_status: Option<String>,
    /// Fulfillment status (e.g., "UNFULFILLED").
    pub display_fulfillment_status: String,
    /// Order total in shop currency.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Summary of a service quote, as shown by the order tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    /// Quote ID.
    pub id: Uuid,
    /// External order ID (the `COT-` reference).
    pub order_id: String,
    /// How the job is handled (owned by the quoting service).
    pub service_mode: String,
    /// Quote status, passed through unchanged.
    pub status: String,
    /// When the quote was requested.
    pub requested_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_summary_json_shape() {
        let order = OrderSummary {
            id: "gid://shopify/Order/1001".to_string(),
            name: "#1001".to_string(),
            created_at: "2026-03-01T12:00:00Z".to_string(),
            display_financial_status: Some("PAID".to_string()),
            display_fulfillment_status: "UNFULFILLED".to_string(),
            total_amount: Decimal::new(4250, 2),
            currency_code: "USD".to_string(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["createdAt"], "2026-03-01T12:00:00Z");
        assert_eq!(json["displayFinancialStatus"], "PAID");
        assert_eq!(json["displayFulfillmentStatus"], "UNFULFILLED");
        assert_eq!(json["totalAmount"], "42.50");
        assert_eq!(json["currencyCode"], "USD");
    }

    #[test]
    fn test_quote_summary_json_shape() {
        let quote = QuoteSummary {
            id: Uuid::nil(),
            order_id: "COT-999".to_string(),
            service_mode: "print_only".to_string(),
            status: "awaiting_review".to_string(),
            requested_at: "2026-03-01T12:00:00Z".parse().unwrap(),
        };

        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["orderId"], "COT-999");
        assert_eq!(json["serviceMode"], "print_only");
        assert_eq!(json["status"], "awaiting_review");
        assert_eq!(json["requestedAt"], "2026-03-01T12:00:00Z");
    }
}
