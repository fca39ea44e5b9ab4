//! Service quote repository.
//!
//! Read-only access to `storefront.service_quote` for the order tracker. Rows
//! are written by the quoting service.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;
use crate::models::QuoteSummary;
use crate::services::tracking::{LookupError, QuoteLookup};

/// Repository for service quote lookups.
#[derive(Clone)]
pub struct QuoteRepository {
    pool: PgPool,
}

impl QuoteRepository {
    /// Create a new quote repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a quote by its external order ID (the `COT-` reference).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<QuoteSummary>, RepositoryError> {
        let quote = sqlx::query_as::<_, QuoteSummary>(
            r"
            SELECT id, order_id, service_mode, status, requested_at
            FROM storefront.service_quote
            WHERE order_id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quote)
    }
}

#[async_trait]
impl QuoteLookup for QuoteRepository {
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<QuoteSummary>, LookupError> {
        Ok(self.get_by_order_id(order_id).await?)
    }
}
