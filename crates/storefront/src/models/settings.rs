//! Store configuration as seen by the storefront.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Serialize;

use kirana_core::cart::ShippingPolicy;

/// Public store profile and checkout policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub store_name: String,
    pub tagline: String,
    pub support_email: String,
    pub support_phone: String,
    pub store_address: String,
    pub logo_url: String,
    pub about: String,
    pub currency: String,
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub partial_payment_percent: u8,
    pub cod_enabled: bool,
}

impl StoreSettings {
    /// Shipping rules for cart pricing.
    #[must_use]
    pub const fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            flat_fee: self.shipping_fee,
            free_threshold: self.free_shipping_threshold,
        }
    }
}

/// Razorpay API credentials. Never serialized.
#[derive(Debug, Clone)]
pub struct RazorpayCredentials {
    pub key_id: String,
    pub key_secret: SecretString,
    pub enabled: bool,
}

impl RazorpayCredentials {
    /// Whether online payments can be taken.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        use secrecy::ExposeSecret;
        self.enabled && !self.key_id.is_empty() && !self.key_secret.expose_secret().is_empty()
    }
}
