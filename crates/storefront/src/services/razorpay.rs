//! Razorpay payment gateway client.
//!
//! Online checkout creates a Razorpay order for the amount due now; the
//! browser completes payment with Razorpay's checkout widget and sends back
//! the payment id and signature, which [`verify_payment_signature`] checks.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::models::RazorpayCredentials;

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Online payments are disabled or credentials are missing.
    #[error("online payments are not configured")]
    NotConfigured,

    /// Amount cannot be expressed in paise.
    #[error("invalid amount")]
    InvalidAmount,

    /// The store currency is not one the gateway is set up for.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Signature did not match.
    #[error("payment signature mismatch")]
    InvalidSignature,
}

/// An order created on the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    description: String,
}

/// Razorpay REST client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    api_base: Url,
}

impl RazorpayClient {
    /// Create a client for the given API base (ending in `/`).
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(api_base: Url) -> Result<Self, PaymentError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, api_base })
    }

    /// Create a gateway order.
    ///
    /// `receipt` is our order number, so gateway dashboards can be matched
    /// back to orders.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotConfigured` if the credentials are unusable,
    /// `PaymentError::Api` if the gateway rejects the request.
    #[instrument(skip(self, credentials), fields(amount_paise))]
    pub async fn create_order(
        &self,
        credentials: &RazorpayCredentials,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        if !credentials.is_usable() {
            return Err(PaymentError::NotConfigured);
        }
        if amount_paise <= 0 {
            return Err(PaymentError::InvalidAmount);
        }

        let url = self
            .api_base
            .join("orders")
            .map_err(|e| PaymentError::Api {
                status: 0,
                message: e.to_string(),
            })?;

        let response = self
            .client
            .post(url)
            .basic_auth(
                &credentials.key_id,
                Some(credentials.key_secret.expose_secret()),
            )
            .json(&CreateOrderRequest {
                amount: amount_paise,
                currency,
                receipt,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.description)
                .unwrap_or(body);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let order: GatewayOrder = response.json().await?;
        debug!(gateway_order_id = %order.id, "Created Razorpay order");
        Ok(order)
    }
}

/// Check the signature Razorpay returns after a successful payment.
///
/// The signature is the hex HMAC-SHA256 of `"{order_id}|{payment_id}"` keyed
/// with the API secret.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignature` if it does not match.
pub fn verify_payment_signature(
    secret: &SecretString,
    gateway_order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), PaymentError> {
    let expected = sign(secret, gateway_order_id, payment_id)?;
    if !constant_time_compare(&expected, &signature.trim().to_ascii_lowercase()) {
        return Err(PaymentError::InvalidSignature);
    }
    Ok(())
}

fn sign(secret: &SecretString, gateway_order_id: &str, payment_id: &str) -> Result<String, PaymentError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare two strings without short-circuiting on the first difference.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test_secret".to_string())
    }

    #[test]
    fn test_valid_signature_is_accepted() {
        let signature = sign(&secret(), "order_ABC", "pay_123").unwrap();
        assert!(verify_payment_signature(&secret(), "order_ABC", "pay_123", &signature).is_ok());
    }

    #[test]
    fn test_signature_is_case_insensitive_hex() {
        let signature = sign(&secret(), "order_ABC", "pay_123").unwrap().to_uppercase();
        assert!(verify_payment_signature(&secret(), "order_ABC", "pay_123", &signature).is_ok());
    }

    #[test]
    fn test_signature_binds_order_and_payment() {
        let signature = sign(&secret(), "order_ABC", "pay_123").unwrap();
        assert!(verify_payment_signature(&secret(), "order_ABC", "pay_999", &signature).is_err());
        assert!(verify_payment_signature(&secret(), "order_XYZ", "pay_123", &signature).is_err());
        let other = SecretString::from("other".to_string());
        assert!(verify_payment_signature(&other, "order_ABC", "pay_123", &signature).is_err());
    }

    #[test]
    fn test_known_vector() {
        let key = SecretString::from("key".to_string());
        assert_eq!(
            sign(&key, "order_1", "pay_1").unwrap(),
            "65219a93f3f6ab8a5f6962209ec83d04e29cd18b30fffd7e1a2aade3a72c199e"
        );
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }

    #[tokio::test]
    async fn test_create_order_requires_credentials() {
        let client = RazorpayClient::new(Url::parse("https://api.razorpay.com/v1/").unwrap()).unwrap();
        let credentials = RazorpayCredentials {
            key_id: String::new(),
            key_secret: SecretString::from(String::new()),
            enabled: true,
        };
        let err = client
            .create_order(&credentials, 1000, "INR", "KR-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotConfigured));
    }
}
