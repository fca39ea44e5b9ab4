//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::tracking::OrderTracker;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    tracker: OrderTracker,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create application state over a tracker.
    ///
    /// # Arguments
    ///
    /// * `tracker` - Order tracker wired to its order and quote collaborators
    /// * `pool` - `PostgreSQL` pool checked by the readiness endpoint, if any
    #[must_use]
    pub fn new(tracker: OrderTracker, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { tracker, pool }),
        }
    }

    /// Get a reference to the order tracker.
    #[must_use]
    pub fn tracker(&self) -> &OrderTracker {
        &self.inner.tracker
    }

    /// Get a reference to the database connection pool, if one is attached.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
