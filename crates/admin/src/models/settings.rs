//! Store settings and payment gateway credentials.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use kirana_core::{CurrencyCode, Email, ValidationErrors};

/// Characters of the secret left visible when masked.
const VISIBLE_SECRET_CHARS: usize = 4;

/// Store profile and checkout policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub store_name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub support_email: String,
    #[serde(default)]
    pub support_phone: String,
    #[serde(default)]
    pub store_address: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub about: String,
    pub currency: String,
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub free_shipping_threshold: Option<Decimal>,
    /// Share of partial-payment lines charged upfront, in percent.
    pub partial_payment_percent: i16,
    pub cod_enabled: bool,
}

impl StoreSettings {
    /// Check values the storefront relies on.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("storeName", &self.store_name);
        if !self.support_email.trim().is_empty() && Email::parse(&self.support_email).is_err() {
            errors.add("supportEmail", "is not a valid email address");
        }
        if self.currency.parse::<CurrencyCode>().is_err() {
            errors.add("currency", "unsupported currency");
        }
        if self.shipping_fee.is_sign_negative() {
            errors.add("shippingFee", "cannot be negative");
        }
        if self.free_shipping_threshold.is_some_and(|t| t.is_sign_negative()) {
            errors.add("freeShippingThreshold", "cannot be negative");
        }
        if !(1..=99).contains(&self.partial_payment_percent) {
            errors.add("partialPaymentPercent", "must be between 1 and 99");
        }
        errors.into_result()
    }
}

/// Stored Razorpay credentials.
#[derive(Debug, Clone)]
pub struct RazorpaySettings {
    pub key_id: String,
    pub key_secret: SecretString,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

/// Razorpay settings with the secret masked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpaySettingsView {
    pub key_id: String,
    pub key_secret: String,
    pub has_secret: bool,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&RazorpaySettings> for RazorpaySettingsView {
    fn from(settings: &RazorpaySettings) -> Self {
        let secret = settings.key_secret.expose_secret();
        Self {
            key_id: settings.key_id.clone(),
            key_secret: mask_secret(secret),
            has_secret: !secret.is_empty(),
            enabled: settings.enabled,
            updated_at: settings.updated_at,
        }
    }
}

/// Body of a Razorpay settings update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpaySettingsInput {
    pub key_id: String,
    /// Absent, blank or still masked keeps the stored secret.
    #[serde(default)]
    pub key_secret: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

impl RazorpaySettingsInput {
    /// Resolve the secret to store and validate the result.
    ///
    /// # Errors
    ///
    /// Returns field errors when enabling without a key id or secret.
    pub fn resolve(&self, stored_secret: &SecretString) -> Result<(String, SecretString), ValidationErrors> {
        let key_id = self.key_id.trim().to_owned();
        let secret = resolve_secret(self.key_secret.as_deref(), stored_secret);

        let mut errors = ValidationErrors::new();
        if self.enabled {
            if key_id.is_empty() {
                errors.add("keyId", "required to enable Razorpay");
            }
            if secret.expose_secret().is_empty() {
                errors.add("keySecret", "required to enable Razorpay");
            }
        }
        errors.into_result()?;
        Ok((key_id, secret))
    }
}

/// Mask a secret down to its last four characters.
///
/// Short secrets are masked completely.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= VISIBLE_SECRET_CHARS {
        return "*".repeat(count);
    }
    let visible: String = secret.chars().skip(count - VISIBLE_SECRET_CHARS).collect();
    format!("{}{visible}", "*".repeat(count - VISIBLE_SECRET_CHARS))
}

/// The secret to store after an update.
///
/// The stored secret is kept when the submitted one is absent, blank, or the
/// masked form the console was shown.
#[must_use]
pub fn resolve_secret(submitted: Option<&str>, stored: &SecretString) -> SecretString {
    match submitted.map(str::trim) {
        Some(s) if !s.is_empty() && s != mask_secret(stored.expose_secret()) => {
            SecretString::from(s.to_owned())
        }
        _ => stored.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings() -> StoreSettings {
        StoreSettings {
            store_name: "Kirana".to_string(),
            tagline: String::new(),
            support_email: "help@kirana.example.in".to_string(),
            support_phone: String::new(),
            store_address: String::new(),
            logo_url: String::new(),
            about: String::new(),
            currency: "INR".to_string(),
            shipping_fee: "49".parse().unwrap(),
            free_shipping_threshold: Some("999".parse().unwrap()),
            partial_payment_percent: 20,
            cod_enabled: true,
        }
    }

    #[test]
    fn test_mask_keeps_last_four() {
        assert_eq!(mask_secret("rzp_secret_abcd1234"), "***************1234");
        assert_eq!(mask_secret("abcd"), "****");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn test_secret_kept_when_absent_blank_or_masked() {
        let stored = SecretString::from("sk_live_9f8e7d6c".to_string());
        let masked = mask_secret("sk_live_9f8e7d6c");

        for submitted in [None, Some(""), Some("   "), Some(masked.as_str())] {
            assert_eq!(
                resolve_secret(submitted, &stored).expose_secret(),
                "sk_live_9f8e7d6c"
            );
        }
        assert_eq!(
            resolve_secret(Some("sk_live_new"), &stored).expose_secret(),
            "sk_live_new"
        );
    }

    #[test]
    fn test_enabling_requires_key_and_secret() {
        let empty = SecretString::from(String::new());
        let input = RazorpaySettingsInput {
            key_id: " ".to_string(),
            key_secret: None,
            enabled: true,
        };
        let errors = input.resolve(&empty).unwrap_err();
        assert!(errors.has("keyId"));
        assert!(errors.has("keySecret"));

        let disabled = RazorpaySettingsInput {
            enabled: false,
            ..input
        };
        assert!(disabled.resolve(&empty).is_ok());
    }

    #[test]
    fn test_view_masks_secret() {
        let view = RazorpaySettingsView::from(&RazorpaySettings {
            key_id: "rzp_test_key".to_string(),
            key_secret: SecretString::from("topsecretvalue".to_string()),
            enabled: true,
            updated_at: Utc::now(),
        });
        assert_eq!(view.key_secret, "**********alue");
        assert!(view.has_secret);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("topsecret"));
    }

    #[test]
    fn test_store_settings_validation() {
        assert!(settings().validate().is_ok());

        let mut bad = settings();
        bad.partial_payment_percent = 100;
        bad.currency = "XYZ".to_string();
        bad.shipping_fee = "-1".parse().unwrap();
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("partialPaymentPercent"));
        assert!(errors.has("currency"));
        assert!(errors.has("shippingFee"));
    }
}
