//! Checkout steps and the order placement request.
//!
//! Checkout is a three-step wizard (shipping, payment, review). Moving between
//! steps is unconditional; the only gate is the final placement request,
//! which must name a shipping address and a payment method the store accepts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::address::AddressInput;
use crate::types::{AddressId, PaymentMethod};
use crate::validation::ValidationErrors;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 64;

/// A step of the checkout wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    /// Steps in wizard order.
    pub const ALL: [Self; 3] = [Self::Shipping, Self::Payment, Self::Review];

    /// The following step, staying on review once there.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Shipping => Self::Payment,
            Self::Payment | Self::Review => Self::Review,
        }
    }

    /// The preceding step, staying on shipping once there.
    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::Shipping | Self::Payment => Self::Shipping,
            Self::Review => Self::Payment,
        }
    }

    /// Zero-based position in the wizard.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Shipping => 0,
            Self::Payment => 1,
            Self::Review => 2,
        }
    }
}

/// Which address an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShippingSelection {
    /// One of the customer's saved addresses.
    Saved { address_id: AddressId },
    /// A new address typed during checkout. It is saved to the customer's
    /// address book together with the order.
    New { address: AddressInput },
}

/// Body of the order placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping: ShippingSelection,
    pub payment_method: PaymentMethod,
    /// Pay only part of partial-payment items now (online payment only).
    #[serde(default)]
    pub pay_partial: bool,
    /// Total the customer saw on the review step. When present, placement
    /// fails if current prices produce a different total.
    #[serde(default)]
    pub expected_total: Option<Decimal>,
    /// Client-generated key; repeating a request with the same key returns
    /// the order created by the first one.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl CheckoutRequest {
    /// Check field presence and shape. Does not touch stored data.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let ShippingSelection::New { address } = &self.shipping
            && let Err(address_errors) = address.validate()
        {
            errors.extend(address_errors);
        }

        if self.pay_partial && !self.payment_method.is_online() {
            errors.add("payPartial", "requires online payment");
        }

        if let Some(key) = &self.idempotency_key {
            let key = key.trim();
            if key.is_empty() {
                errors.add("idempotencyKey", "cannot be blank");
            } else if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
                errors.add(
                    "idempotencyKey",
                    format!("must be at most {MAX_IDEMPOTENCY_KEY_LEN} characters"),
                );
            }
        }

        if let Some(total) = self.expected_total
            && total.is_sign_negative()
        {
            errors.add("expectedTotal", "cannot be negative");
        }

        errors.into_result()
    }

    /// The idempotency key with whitespace trimmed.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Payment methods offered at checkout given store configuration.
#[must_use]
pub fn available_payment_methods(cod_enabled: bool, online_enabled: bool) -> Vec<PaymentMethod> {
    let mut methods = Vec::with_capacity(2);
    if online_enabled {
        methods.push(PaymentMethod::Razorpay);
    }
    if cod_enabled {
        methods.push(PaymentMethod::CashOnDelivery);
    }
    methods
}

/// Whether a client-supplied total still matches the server's total.
///
/// Totals are compared to the paisa.
#[must_use]
pub fn total_matches(expected: Option<Decimal>, actual: Decimal) -> bool {
    expected.is_none_or(|e| e.round_dp(2) == actual.round_dp(2))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::AddressType;

    fn address() -> AddressInput {
        AddressInput {
            full_name: "Ravi Kumar".to_owned(),
            street: "4 Park St".to_owned(),
            city: "Kolkata".to_owned(),
            state: "WB".to_owned(),
            zip_code: "700016".to_owned(),
            country: "India".to_owned(),
            phone_number: "9830012345".to_owned(),
            address_type: AddressType::Home,
            is_default: false,
        }
    }

    fn request(shipping: ShippingSelection, method: PaymentMethod) -> CheckoutRequest {
        CheckoutRequest {
            shipping,
            payment_method: method,
            pay_partial: false,
            expected_total: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn steps_move_unconditionally_and_saturate() {
        assert_eq!(CheckoutStep::Shipping.next(), CheckoutStep::Payment);
        assert_eq!(CheckoutStep::Payment.next(), CheckoutStep::Review);
        assert_eq!(CheckoutStep::Review.next(), CheckoutStep::Review);
        assert_eq!(CheckoutStep::Review.previous(), CheckoutStep::Payment);
        assert_eq!(CheckoutStep::Shipping.previous(), CheckoutStep::Shipping);
        for (i, step) in CheckoutStep::ALL.into_iter().enumerate() {
            assert_eq!(step.index(), i);
        }
    }

    #[test]
    fn saved_address_request_is_valid() {
        let req = request(
            ShippingSelection::Saved {
                address_id: AddressId::new(4),
            },
            PaymentMethod::CashOnDelivery,
        );
        assert!(req.validate().is_ok());
    }

    #[test]
    fn new_address_fields_are_checked() {
        let mut incomplete = address();
        incomplete.city = String::new();
        let req = request(
            ShippingSelection::New {
                address: incomplete,
            },
            PaymentMethod::Razorpay,
        );
        let errors = req.validate().unwrap_err();
        assert!(errors.has("city"));
    }

    #[test]
    fn partial_payment_needs_online_method() {
        let mut req = request(
            ShippingSelection::New { address: address() },
            PaymentMethod::CashOnDelivery,
        );
        req.pay_partial = true;
        assert!(req.validate().unwrap_err().has("payPartial"));

        req.payment_method = PaymentMethod::Razorpay;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn idempotency_key_is_trimmed_and_bounded() {
        let mut req = request(
            ShippingSelection::Saved {
                address_id: AddressId::new(1),
            },
            PaymentMethod::Razorpay,
        );
        req.idempotency_key = Some("  abc-123 ".to_owned());
        assert_eq!(req.idempotency_key(), Some("abc-123"));

        req.idempotency_key = Some("x".repeat(65));
        assert!(req.validate().unwrap_err().has("idempotencyKey"));
    }

    #[test]
    fn deserializes_tagged_shipping_selection() {
        let json = r#"{
            "shipping": {"type": "saved", "addressId": 7},
            "paymentMethod": "razorpay",
            "expectedTotal": "548.50"
        }"#;
        let req: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            req.shipping,
            ShippingSelection::Saved {
                address_id: AddressId::new(7)
            }
        );
        assert_eq!(req.expected_total, Some("548.50".parse().unwrap()));
        assert!(!req.pay_partial);
    }

    #[test]
    fn payment_methods_follow_configuration() {
        assert_eq!(
            available_payment_methods(true, true),
            vec![PaymentMethod::Razorpay, PaymentMethod::CashOnDelivery]
        );
        assert_eq!(
            available_payment_methods(true, false),
            vec![PaymentMethod::CashOnDelivery]
        );
        assert!(available_payment_methods(false, false).is_empty());
    }

    #[test]
    fn expected_total_comparison() {
        let actual: Decimal = "548.50".parse().unwrap();
        assert!(total_matches(None, actual));
        assert!(total_matches(Some("548.5".parse().unwrap()), actual));
        assert!(!total_matches(Some("548.49".parse().unwrap()), actual));
    }
}
