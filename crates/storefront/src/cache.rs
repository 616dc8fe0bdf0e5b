//! Read-through cache for the store profile.
//!
//! Store settings are read on almost every page load and edited rarely. They
//! are cached for 60 seconds, so admin edits show up within a minute. Hero
//! banners are not cached: an admin toggling a banner expects the next page
//! load to reflect it.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use crate::db::{RepositoryError, SettingsRepository};
use crate::models::StoreSettings;

const TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    StoreSettings,
}

/// Cache of storefront content.
#[derive(Clone)]
pub struct ContentCache {
    cache: Cache<CacheKey, StoreSettings>,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(4).time_to_live(TTL).build(),
        }
    }

    /// Current store settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the settings must be loaded and the query fails.
    pub async fn store_settings(&self, pool: &PgPool) -> Result<StoreSettings, RepositoryError> {
        if let Some(settings) = self.cache.get(&CacheKey::StoreSettings).await {
            debug!("Cache hit for store settings");
            return Ok(settings);
        }

        let settings = SettingsRepository::new(pool).store().await?;
        self.cache
            .insert(CacheKey::StoreSettings, settings.clone())
            .await;
        Ok(settings)
    }
}
