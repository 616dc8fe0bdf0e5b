//! Cart pricing.
//!
//! The storefront shows these numbers on the cart and checkout pages, and the
//! order placement recomputes them from current database prices before
//! writing the order. Both paths go through [`price_cart`], so what the
//! customer saw is what gets charged unless a price changed in between.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::types::ProductId;

/// Largest quantity of a single product in one cart.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors from cart quantity and stock checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantity outside `1..=MAX_LINE_QUANTITY`.
    #[error("quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,

    /// Not enough tracked stock to cover the requested quantity.
    #[error("only {available} left in stock")]
    InsufficientStock {
        /// Units currently available.
        available: u32,
    },

    /// The product is no longer sold.
    #[error("product is unavailable")]
    Unavailable,
}

/// Validate a quantity coming from a request body.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` if the value is not in `1..=99`.
pub fn validate_quantity(quantity: i64) -> Result<u32, CartError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
        .ok_or(CartError::InvalidQuantity)
}

/// Quantity after adding `added` units to a line that already holds `existing`.
///
/// # Errors
///
/// Returns `CartError::InvalidQuantity` if the sum exceeds the per-line cap.
pub fn combined_quantity(existing: u32, added: u32) -> Result<u32, CartError> {
    existing
        .checked_add(added)
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or(CartError::InvalidQuantity)
}

/// Check a requested quantity against tracked stock.
///
/// `stock` is `None` for products whose inventory is not tracked locally
/// (supplier items), which are always available.
///
/// # Errors
///
/// Returns `CartError::InsufficientStock` when the request exceeds stock.
pub fn check_stock(requested: u32, stock: Option<i32>) -> Result<(), CartError> {
    let Some(stock) = stock else {
        return Ok(());
    };
    let available = u32::try_from(stock).unwrap_or(0);
    if requested > available {
        return Err(CartError::InsufficientStock { available });
    }
    Ok(())
}

/// Unit price after applying a discount price.
///
/// A discount price only applies when it is positive and below the list price.
#[must_use]
pub fn effective_unit_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(discount) if discount > Decimal::ZERO && discount < price => discount,
        _ => price,
    }
}

/// A cart line with its price resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    /// Whether the product's category allows partial upfront payment.
    pub partial_payment: bool,
}

impl PricedLine {
    /// Price a line from a product's list and discount prices.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: String,
        image: Option<String>,
        price: Decimal,
        discount_price: Option<Decimal>,
        quantity: u32,
        partial_payment: bool,
    ) -> Self {
        let unit_price = effective_unit_price(price, discount_price);
        Self {
            product_id,
            name,
            image,
            unit_price,
            quantity,
            line_total: unit_price * Decimal::from(quantity),
            partial_payment,
        }
    }
}

/// Flat-rate shipping with an optional free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShippingPolicy {
    pub flat_fee: Decimal,
    pub free_threshold: Option<Decimal>,
}

impl ShippingPolicy {
    /// Shipping fee for a given subtotal. Empty carts ship free.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match self.free_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.flat_fee.max(Decimal::ZERO),
        }
    }
}

/// Totals for a priced cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

/// Compute totals for priced lines.
#[must_use]
pub fn price_cart(lines: &[PricedLine], shipping: &ShippingPolicy) -> CartTotals {
    let subtotal: Decimal = lines.iter().map(|l| l.line_total).sum();
    let item_count = lines.iter().map(|l| l.quantity).sum();
    let shipping_fee = shipping.fee_for(subtotal);
    CartTotals {
        item_count,
        subtotal,
        shipping_fee,
        total: subtotal + shipping_fee,
    }
}

/// How much of an order is collected now versus on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSplit {
    pub due_now: Decimal,
    pub due_on_delivery: Decimal,
}

impl PaymentSplit {
    /// Everything collected up front.
    #[must_use]
    pub const fn full(totals: &CartTotals) -> Self {
        Self {
            due_now: totals.total,
            due_on_delivery: Decimal::ZERO,
        }
    }

    /// Everything collected on delivery (cash on delivery).
    #[must_use]
    pub const fn on_delivery(totals: &CartTotals) -> Self {
        Self {
            due_now: Decimal::ZERO,
            due_on_delivery: totals.total,
        }
    }

    /// Partial upfront payment.
    ///
    /// Lines in partial-payment categories are charged `percent`% now; all
    /// other lines and shipping are charged in full now. The remainder is
    /// collected on delivery. Returns `None` when no line qualifies.
    #[must_use]
    pub fn partial(lines: &[PricedLine], totals: &CartTotals, percent: u8) -> Option<Self> {
        if !lines.iter().any(|l| l.partial_payment) || percent == 0 || percent >= 100 {
            return None;
        }

        let rate = Decimal::from(percent) / Decimal::ONE_HUNDRED;
        let upfront_lines: Decimal = lines
            .iter()
            .map(|l| {
                if l.partial_payment {
                    (l.line_total * rate).round_dp(2)
                } else {
                    l.line_total
                }
            })
            .sum();

        let due_now = upfront_lines + totals.shipping_fee;
        Some(Self {
            due_now,
            due_on_delivery: totals.total - due_now,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(id: i32, price: &str, discount: Option<&str>, qty: u32, partial: bool) -> PricedLine {
        PricedLine::new(
            ProductId::new(id),
            format!("Product {id}"),
            None,
            dec(price),
            discount.map(dec),
            qty,
            partial,
        )
    }

    #[test]
    fn discount_applies_only_when_lower_and_positive() {
        assert_eq!(effective_unit_price(dec("100"), Some(dec("80"))), dec("80"));
        assert_eq!(effective_unit_price(dec("100"), Some(dec("120"))), dec("100"));
        assert_eq!(effective_unit_price(dec("100"), Some(dec("0"))), dec("100"));
        assert_eq!(effective_unit_price(dec("100"), None), dec("100"));
    }

    #[test]
    fn quantity_bounds() {
        assert_eq!(validate_quantity(1), Ok(1));
        assert_eq!(validate_quantity(99), Ok(99));
        assert_eq!(validate_quantity(0), Err(CartError::InvalidQuantity));
        assert_eq!(validate_quantity(-3), Err(CartError::InvalidQuantity));
        assert_eq!(validate_quantity(100), Err(CartError::InvalidQuantity));
        assert_eq!(combined_quantity(98, 1), Ok(99));
        assert_eq!(combined_quantity(98, 2), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn stock_checks() {
        assert!(check_stock(5, None).is_ok());
        assert!(check_stock(5, Some(5)).is_ok());
        assert_eq!(
            check_stock(6, Some(5)),
            Err(CartError::InsufficientStock { available: 5 })
        );
        assert_eq!(
            check_stock(1, Some(-2)),
            Err(CartError::InsufficientStock { available: 0 })
        );
    }

    #[test]
    fn totals_include_shipping_below_threshold() {
        let policy = ShippingPolicy {
            flat_fee: dec("49"),
            free_threshold: Some(dec("999")),
        };
        let lines = vec![line(1, "250", Some("200"), 2, false), line(2, "99.50", None, 1, false)];
        let totals = price_cart(&lines, &policy);
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, dec("499.50"));
        assert_eq!(totals.shipping_fee, dec("49"));
        assert_eq!(totals.total, dec("548.50"));
    }

    #[test]
    fn shipping_is_free_at_threshold_and_for_empty_cart() {
        let policy = ShippingPolicy {
            flat_fee: dec("49"),
            free_threshold: Some(dec("500")),
        };
        assert_eq!(policy.fee_for(dec("500")), Decimal::ZERO);
        assert_eq!(policy.fee_for(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(price_cart(&[], &policy).total, Decimal::ZERO);
    }

    #[test]
    fn partial_split_charges_percent_of_eligible_lines() {
        let policy = ShippingPolicy {
            flat_fee: dec("50"),
            free_threshold: None,
        };
        let lines = vec![line(1, "1000", None, 1, true), line(2, "200", None, 1, false)];
        let totals = price_cart(&lines, &policy);
        assert_eq!(totals.total, dec("1250"));

        let split = PaymentSplit::partial(&lines, &totals, 20).unwrap();
        // 20% of 1000 + 200 + 50 shipping
        assert_eq!(split.due_now, dec("450"));
        assert_eq!(split.due_on_delivery, dec("800"));
    }

    #[test]
    fn partial_split_requires_eligible_line_and_sane_percent() {
        let lines = vec![line(1, "100", None, 1, false)];
        let totals = price_cart(&lines, &ShippingPolicy::default());
        assert!(PaymentSplit::partial(&lines, &totals, 20).is_none());

        let eligible = vec![line(1, "100", None, 1, true)];
        let totals = price_cart(&eligible, &ShippingPolicy::default());
        assert!(PaymentSplit::partial(&eligible, &totals, 0).is_none());
        assert!(PaymentSplit::partial(&eligible, &totals, 100).is_none());
    }

    #[test]
    fn full_and_on_delivery_splits() {
        let lines = vec![line(1, "10", None, 3, false)];
        let totals = price_cart(&lines, &ShippingPolicy::default());
        assert_eq!(PaymentSplit::full(&totals).due_now, dec("30"));
        assert_eq!(PaymentSplit::on_delivery(&totals).due_on_delivery, dec("30"));
    }
}
