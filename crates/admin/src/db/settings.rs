//! Store and Razorpay settings (singleton rows in the `shop` schema).

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{RazorpaySettings, StoreSettings};

const STORE_COLUMNS: &str = "store_name, tagline, support_email, support_phone, store_address, \
     logo_url, about, currency, shipping_fee, free_shipping_threshold, \
     partial_payment_percent, cod_enabled";

#[derive(Debug, sqlx::FromRow)]
struct StoreSettingsRow {
    store_name: String,
    tagline: String,
    support_email: String,
    support_phone: String,
    store_address: String,
    logo_url: String,
    about: String,
    currency: String,
    shipping_fee: rust_decimal::Decimal,
    free_shipping_threshold: Option<rust_decimal::Decimal>,
    partial_payment_percent: i16,
    cod_enabled: bool,
}

impl From<StoreSettingsRow> for StoreSettings {
    fn from(row: StoreSettingsRow) -> Self {
        Self {
            store_name: row.store_name,
            tagline: row.tagline,
            support_email: row.support_email,
            support_phone: row.support_phone,
            store_address: row.store_address,
            logo_url: row.logo_url,
            about: row.about,
            currency: row.currency,
            shipping_fee: row.shipping_fee,
            free_shipping_threshold: row.free_shipping_threshold,
            partial_payment_percent: row.partial_payment_percent,
            cod_enabled: row.cod_enabled,
        }
    }
}

/// Repository for the settings rows.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current store settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row is missing (migrations not applied).
    pub async fn store(&self) -> Result<StoreSettings, RepositoryError> {
        let row = sqlx::query_as::<_, StoreSettingsRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM shop.store_settings WHERE id"
        ))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Replace the store settings. The input must already be validated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row is missing.
    pub async fn update_store(&self, settings: &StoreSettings) -> Result<StoreSettings, RepositoryError> {
        let row = sqlx::query_as::<_, StoreSettingsRow>(&format!(
            "UPDATE shop.store_settings SET \
                store_name = $1, tagline = $2, support_email = $3, support_phone = $4, \
                store_address = $5, logo_url = $6, about = $7, currency = $8, \
                shipping_fee = $9, free_shipping_threshold = $10, \
                partial_payment_percent = $11, cod_enabled = $12, updated_at = NOW() \
             WHERE id \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(settings.store_name.trim())
        .bind(settings.tagline.trim())
        .bind(settings.support_email.trim())
        .bind(settings.support_phone.trim())
        .bind(settings.store_address.trim())
        .bind(settings.logo_url.trim())
        .bind(&settings.about)
        .bind(settings.currency.trim())
        .bind(settings.shipping_fee)
        .bind(settings.free_shipping_threshold)
        .bind(settings.partial_payment_percent)
        .bind(settings.cod_enabled)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Current Razorpay credentials.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row is missing.
    pub async fn razorpay(&self) -> Result<RazorpaySettings, RepositoryError> {
        let (key_id, key_secret, enabled, updated_at): (String, String, bool, DateTime<Utc>) =
            sqlx::query_as(
                "SELECT key_id, key_secret, enabled, updated_at FROM shop.razorpay_settings WHERE id",
            )
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(RazorpaySettings {
            key_id,
            key_secret: SecretString::from(key_secret),
            enabled,
            updated_at,
        })
    }

    /// Store Razorpay credentials.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row is missing.
    pub async fn update_razorpay(
        &self,
        key_id: &str,
        key_secret: &SecretString,
        enabled: bool,
    ) -> Result<RazorpaySettings, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE shop.razorpay_settings
            SET key_id = $1, key_secret = $2, enabled = $3, updated_at = NOW()
            WHERE id
            ",
        )
        .bind(key_id)
        .bind(key_secret.expose_secret())
        .bind(enabled)
        .execute(self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.razorpay().await
    }
}
