//! Store and payment gateway settings (singleton rows).

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{RazorpayCredentials, StoreSettings};

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
    shipping_fee: Decimal,
    free_shipping_threshold: Option<Decimal>,
    partial_payment_percent: i16,
    cod_enabled: bool,
}

impl TryFrom<StoreSettingsRow> for StoreSettings {
    type Error = RepositoryError;

    fn try_from(row: StoreSettingsRow) -> Result<Self, Self::Error> {
        let partial_payment_percent = u8::try_from(row.partial_payment_percent)
            .ok()
            .filter(|p| (1..100).contains(p))
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid partial payment percent: {}",
                    row.partial_payment_percent
                ))
            })?;

        Ok(Self {
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
            partial_payment_percent,
            cod_enabled: row.cod_enabled,
        })
    }
}

/// Read access to the settings rows maintained by the admin console.
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
    /// Returns `RepositoryError::NotFound` if the settings row is missing
    /// (migrations not applied).
    pub async fn store(&self) -> Result<StoreSettings, RepositoryError> {
        let row = sqlx::query_as::<_, StoreSettingsRow>(
            r"
            SELECT store_name, tagline, support_email, support_phone, store_address,
                   logo_url, about, currency, shipping_fee, free_shipping_threshold,
                   partial_payment_percent, cod_enabled
            FROM shop.store_settings
            WHERE id
            ",
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Current Razorpay credentials.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the settings row is missing.
    pub async fn razorpay(&self) -> Result<RazorpayCredentials, RepositoryError> {
        let (key_id, key_secret, enabled): (String, String, bool) = sqlx::query_as(
            "SELECT key_id, key_secret, enabled FROM shop.razorpay_settings WHERE id",
        )
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(RazorpayCredentials {
            key_id,
            key_secret: SecretString::from(key_secret),
            enabled,
        })
    }
}
