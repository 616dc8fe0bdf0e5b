//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::ContentCache;
use crate::config::StorefrontConfig;
use crate::services::razorpay::{PaymentError, RazorpayClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    razorpay: RazorpayClient,
    content: ContentCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment gateway HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let razorpay = RazorpayClient::new(config.razorpay_api_base.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                razorpay,
                content: ContentCache::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Razorpay client.
    #[must_use]
    pub fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }

    /// Get a reference to the content cache.
    #[must_use]
    pub fn content(&self) -> &ContentCache {
        &self.inner.content
    }
}

/// State backed by a pool that never connects, for router tests that are
/// rejected before touching the database.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_state() -> AppState {
    use secrecy::ExposeSecret;

    let config = crate::config::test_config();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(config.database_url.expose_secret())
        .unwrap();
    AppState::new(config, pool).unwrap()
}
