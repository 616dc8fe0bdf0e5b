//! Checkout: the summary shown across the wizard and order placement.
//!
//! Placement runs in one transaction that first takes a per-customer advisory
//! lock, so concurrent placements by the same customer queue up. It prices
//! the cart twice. The first pass, without row locks, decides the amount for
//! the gateway order. The second pass locks the cart and product rows, and
//! the order is only written if both passes agree. Everything that changes stored data
//! (a new address, the order with its items and first timeline event, stock,
//! the cart) commits together or not at all.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use kirana_core::address::ShippingAddress;
use kirana_core::cart::{CartError, CartTotals, PaymentSplit, PricedLine, check_stock, price_cart};
use kirana_core::checkout::{
    CheckoutRequest, CheckoutStep, ShippingSelection, available_payment_methods, total_matches,
};
use kirana_core::{AddressId, CurrencyCode, CustomerId, PaymentMethod, Price, ProductId, ValidationErrors};

use super::cart::CartView;
use super::razorpay::{PaymentError, RazorpayClient};
use crate::db::carts::{self, CartLine};
use crate::db::orders::{self, NewOrder};
use crate::db::{AddressRepository, CartRepository, OrderRepository, RepositoryError, addresses};
use crate::models::{Address, Order, RazorpayCredentials, StoreSettings};

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invalid checkout request")]
    Validation(ValidationErrors),

    #[error("cart is empty")]
    EmptyCart,

    /// The saved address does not exist or belongs to someone else.
    #[error("shipping address not found")]
    AddressNotFound,

    #[error("payment method not available")]
    PaymentMethodUnavailable,

    /// A line can no longer be fulfilled.
    #[error("{name}: {reason}")]
    Stock {
        product_id: ProductId,
        name: String,
        reason: CartError,
    },

    /// Prices changed since the customer reviewed the order.
    #[error("order total changed to {actual}")]
    PriceChanged { actual: Decimal },

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Partial upfront payment offered at checkout.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPaymentOffer {
    pub percent: u8,
    #[serde(flatten)]
    pub split: PaymentSplit,
}

/// Everything the checkout wizard needs in one response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub steps: [CheckoutStep; 3],
    pub cart: CartView,
    pub addresses: Vec<Address>,
    pub default_address_id: Option<AddressId>,
    /// No saved addresses: the shipping step must collect a new one.
    pub requires_new_address: bool,
    pub payment_methods: Vec<PaymentMethod>,
    pub partial_payment: Option<PartialPaymentOffer>,
}

/// What the client needs to open the Razorpay checkout widget.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayPayment {
    pub key_id: String,
    pub order_id: String,
    /// Amount in paise.
    pub amount: i64,
    pub currency: String,
}

/// Result of a placement request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub razorpay: Option<RazorpayPayment>,
    /// The order already existed for the request's idempotency key.
    pub replayed: bool,
}

/// Checkout service for one customer.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    razorpay: &'a RazorpayClient,
    customer_id: CustomerId,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, razorpay: &'a RazorpayClient, customer_id: CustomerId) -> Self {
        Self {
            pool,
            razorpay,
            customer_id,
        }
    }

    /// Build the checkout summary.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Repository` if a read fails.
    pub async fn summary(
        &self,
        settings: &StoreSettings,
        credentials: &RazorpayCredentials,
    ) -> Result<CheckoutSummary, CheckoutError> {
        let lines = CartRepository::new(self.pool).lines(self.customer_id).await?;
        let cart = CartView::from_lines(&lines, &settings.shipping_policy());
        let addresses = AddressRepository::new(self.pool).list(self.customer_id).await?;

        let online = credentials.is_usable();
        let partial_payment = if online {
            PaymentSplit::partial(&cart.items, &cart.totals, settings.partial_payment_percent)
                .map(|split| PartialPaymentOffer {
                    percent: settings.partial_payment_percent,
                    split,
                })
        } else {
            None
        };

        Ok(CheckoutSummary {
            steps: CheckoutStep::ALL,
            default_address_id: addresses.iter().find(|a| a.is_default).map(|a| a.id),
            requires_new_address: addresses.is_empty(),
            addresses,
            payment_methods: available_payment_methods(settings.cod_enabled, online),
            partial_payment,
            cart,
        })
    }

    /// Place an order from the customer's cart.
    ///
    /// Placements for one customer run one at a time, so a repeated request
    /// with the same idempotency key always finds the first order.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]; nothing is written when an error is returned.
    /// An empty cart is reported before anything about the request body.
    #[instrument(skip_all, fields(customer_id = %self.customer_id, payment_method = ?request.payment_method))]
    pub async fn place(
        &self,
        request: &CheckoutRequest,
        settings: &StoreSettings,
        credentials: &RazorpayCredentials,
    ) -> Result<PlacedOrder, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        orders::lock_placement(&mut tx, self.customer_id).await?;

        if let Some(key) = request.idempotency_key()
            && let Some(order) =
                orders::find_by_idempotency_key_on(&mut tx, self.customer_id, key).await?
        {
            info!(order_number = %order.order_number, "Replaying idempotent order placement");
            return Ok(replayed(order, credentials));
        }

        // First pricing pass: decides the gateway amount. Only the placement
        // lock is held, so other customers are not blocked by the gateway call.
        let lines = carts::load_lines(&mut tx, self.customer_id, false).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        request.validate().map_err(CheckoutError::Validation)?;

        let online = credentials.is_usable();
        if !available_payment_methods(settings.cod_enabled, online).contains(&request.payment_method) {
            return Err(CheckoutError::PaymentMethodUnavailable);
        }
        let currency = settings
            .currency
            .parse::<CurrencyCode>()
            .map_err(|_| PaymentError::UnsupportedCurrency(settings.currency.clone()))?;

        let policy = settings.shipping_policy();
        let (priced, totals) = price_and_check(&lines, &policy)?;
        if !total_matches(request.expected_total, totals.total) {
            return Err(CheckoutError::PriceChanged {
                actual: totals.total,
            });
        }
        let split = payment_split(request, &priced, &totals, settings.partial_payment_percent);

        let order_number = generate_order_number();
        let gateway_order = if request.payment_method.is_online() {
            let amount = Price::new(split.due_now, currency)
                .minor_units()
                .ok_or(PaymentError::InvalidAmount)?;
            Some(
                self.razorpay
                    .create_order(credentials, amount, currency.code(), &order_number)
                    .await?,
            )
        } else {
            None
        };

        // Second pass with cart and product rows locked; everything below
        // commits together.
        let locked = carts::load_lines(&mut tx, self.customer_id, true).await?;
        let (locked_priced, locked_totals) = price_and_check(&locked, &policy)?;
        if locked_priced != priced || locked_totals != totals {
            warn!("Cart changed during placement");
            return Err(CheckoutError::PriceChanged {
                actual: locked_totals.total,
            });
        }

        let shipping_address: ShippingAddress = match &request.shipping {
            ShippingSelection::Saved { address_id } => {
                let address = addresses::fetch_owned(&mut tx, self.customer_id, *address_id)
                    .await?
                    .ok_or(CheckoutError::AddressNotFound)?;
                (&address).into()
            }
            ShippingSelection::New { address } => {
                let saved = addresses::insert(&mut tx, self.customer_id, &address.normalized()).await?;
                (&saved).into()
            }
        };

        let new_order = NewOrder {
            order_number: &order_number,
            customer_id: self.customer_id,
            payment_method: request.payment_method,
            lines: &priced,
            totals,
            split,
            shipping_address: &shipping_address,
            currency: currency.code(),
            idempotency_key: request.idempotency_key(),
            razorpay_order_id: gateway_order.as_ref().map(|g| g.id.as_str()),
        };
        let order_id = match orders::insert_order(&mut tx, &new_order).await {
            Ok(id) => id,
            Err(RepositoryError::Conflict(_)) => {
                drop(tx);
                return self.replay(request, credentials).await;
            }
            Err(e) => return Err(e.into()),
        };

        for line in &priced {
            if !orders::decrement_stock(&mut tx, line.product_id, line.quantity).await? {
                return Err(CheckoutError::Stock {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    reason: CartError::InsufficientStock { available: 0 },
                });
            }
        }

        carts::clear_on(&mut tx, self.customer_id).await?;

        let (_, order) = orders::load(&mut tx, order_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );

        Ok(PlacedOrder {
            razorpay: gateway_order.map(|g| RazorpayPayment {
                key_id: credentials.key_id.clone(),
                order_id: g.id,
                amount: g.amount,
                currency: g.currency,
            }),
            order,
            replayed: false,
        })
    }

    /// Return the order stored under the request's idempotency key.
    async fn replay(
        &self,
        request: &CheckoutRequest,
        credentials: &RazorpayCredentials,
    ) -> Result<PlacedOrder, CheckoutError> {
        let key = request.idempotency_key().ok_or(RepositoryError::NotFound)?;
        let order = OrderRepository::new(self.pool)
            .find_by_idempotency_key(self.customer_id, key)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(replayed(order, credentials))
    }
}

fn replayed(order: Order, credentials: &RazorpayCredentials) -> PlacedOrder {
    PlacedOrder {
        razorpay: pending_payment(&order, credentials),
        order,
        replayed: true,
    }
}

/// Price cart lines and check each against tracked stock.
fn price_and_check(
    lines: &[CartLine],
    policy: &kirana_core::cart::ShippingPolicy,
) -> Result<(Vec<PricedLine>, CartTotals), CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    for line in lines {
        if !line.available {
            return Err(CheckoutError::Stock {
                product_id: line.product.id,
                name: line.product.name.clone(),
                reason: CartError::Unavailable,
            });
        }
        check_stock(line.quantity, line.product.stock).map_err(|reason| CheckoutError::Stock {
            product_id: line.product.id,
            name: line.product.name.clone(),
            reason,
        })?;
    }
    let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
    let totals = price_cart(&priced, policy);
    Ok((priced, totals))
}

/// How the total is split between now and delivery.
fn payment_split(
    request: &CheckoutRequest,
    lines: &[PricedLine],
    totals: &CartTotals,
    partial_percent: u8,
) -> PaymentSplit {
    match request.payment_method {
        PaymentMethod::CashOnDelivery => PaymentSplit::on_delivery(totals),
        PaymentMethod::Razorpay if request.pay_partial => {
            PaymentSplit::partial(lines, totals, partial_percent)
                .unwrap_or_else(|| PaymentSplit::full(totals))
        }
        PaymentMethod::Razorpay => PaymentSplit::full(totals),
    }
}

/// Gateway details for an unpaid online order, so a replayed placement can
/// still open the payment widget.
fn pending_payment(order: &Order, credentials: &RazorpayCredentials) -> Option<RazorpayPayment> {
    if order.payment_status != kirana_core::PaymentStatus::Pending {
        return None;
    }
    let order_id = order.razorpay_order_id.clone()?;
    let currency = order.currency.parse::<CurrencyCode>().ok()?;
    let amount = Price::new(order.amount_due_now, currency).minor_units()?;
    Some(RazorpayPayment {
        key_id: credentials.key_id.clone(),
        order_id,
        amount,
        currency: currency.code().to_owned(),
    })
}

/// Human-friendly order number, e.g. `KR-261018-4F9A1C2B`.
fn generate_order_number() -> String {
    let date = chrono::Utc::now().format("%y%m%d");
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_ascii_uppercase();
    format!("KR-{date}-{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kirana_core::cart::ShippingPolicy;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn request(method: PaymentMethod, pay_partial: bool) -> CheckoutRequest {
        CheckoutRequest {
            shipping: ShippingSelection::Saved {
                address_id: AddressId::new(1),
            },
            payment_method: method,
            pay_partial,
            expected_total: None,
            idempotency_key: None,
        }
    }

    fn lines() -> (Vec<PricedLine>, CartTotals) {
        let lines = vec![
            PricedLine::new(ProductId::new(1), "Rice".into(), None, dec("1000"), None, 1, true),
            PricedLine::new(ProductId::new(2), "Dal".into(), None, dec("200"), None, 1, false),
        ];
        let totals = price_cart(
            &lines,
            &ShippingPolicy {
                flat_fee: dec("50"),
                free_threshold: None,
            },
        );
        (lines, totals)
    }

    fn cart_line(stock: Option<i32>, available: bool) -> CartLine {
        CartLine {
            product: crate::models::Product {
                id: ProductId::new(3),
                source: kirana_core::ProductSource::Store,
                pid: None,
                name: "Ghee".into(),
                description: String::new(),
                price: dec("650"),
                discount_price: None,
                images: Vec::new(),
                category: None,
                stock,
            },
            quantity: 2,
            available,
        }
    }

    #[test]
    fn test_delisted_product_blocks_placement() {
        let err = price_and_check(&[cart_line(None, false)], &ShippingPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Stock {
                reason: CartError::Unavailable,
                ..
            }
        ));
    }

    #[test]
    fn test_tracked_stock_is_checked_per_line() {
        let err = price_and_check(&[cart_line(Some(1), true)], &ShippingPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Stock {
                reason: CartError::InsufficientStock { available: 1 },
                ..
            }
        ));

        let (priced, totals) =
            price_and_check(&[cart_line(Some(2), true)], &ShippingPolicy::default()).unwrap();
        assert_eq!(priced.len(), 1);
        assert_eq!(totals.total, dec("1300"));
    }

    #[test]
    fn test_replayed_payment_uses_order_currency() {
        let order = Order {
            id: kirana_core::OrderId::new(1),
            order_number: "KR-261018-0000ABCD".into(),
            status: kirana_core::OrderStatus::Placed,
            payment_method: PaymentMethod::Razorpay,
            payment_status: kirana_core::PaymentStatus::Pending,
            items: Vec::new(),
            subtotal: dec("10"),
            shipping_fee: Decimal::ZERO,
            total: dec("10"),
            amount_due_now: dec("10"),
            amount_due_on_delivery: Decimal::ZERO,
            currency: "USD".into(),
            shipping_address: ShippingAddress {
                full_name: "Asha Menon".into(),
                street: "12 MG Road".into(),
                city: "Bengaluru".into(),
                state: "KA".into(),
                zip_code: "560001".into(),
                country: "India".into(),
                phone_number: "9876543210".into(),
            },
            razorpay_order_id: Some("order_abc".into()),
            timeline: Vec::new(),
            created_at: chrono::Utc::now(),
        };
        let credentials = RazorpayCredentials {
            key_id: "rzp_test_key".into(),
            key_secret: secrecy::SecretString::from("secret"),
            enabled: true,
        };
        let payment = pending_payment(&order, &credentials).unwrap();
        assert_eq!(payment.currency, "USD");
        assert_eq!(payment.amount, 1000);
        assert_eq!(payment.order_id, "order_abc");
    }

    #[test]
    fn test_empty_cart_is_rejected_before_pricing() {
        let err = price_and_check(&[], &ShippingPolicy::default()).unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn test_cash_on_delivery_defers_everything() {
        let (lines, totals) = lines();
        let split = payment_split(&request(PaymentMethod::CashOnDelivery, false), &lines, &totals, 20);
        assert_eq!(split.due_now, Decimal::ZERO);
        assert_eq!(split.due_on_delivery, dec("1250"));
    }

    #[test]
    fn test_online_payment_splits_only_when_asked() {
        let (lines, totals) = lines();
        let full = payment_split(&request(PaymentMethod::Razorpay, false), &lines, &totals, 20);
        assert_eq!(full.due_now, dec("1250"));

        let partial = payment_split(&request(PaymentMethod::Razorpay, true), &lines, &totals, 20);
        assert_eq!(partial.due_now, dec("450"));
        assert_eq!(partial.due_on_delivery, dec("800"));
    }

    #[test]
    fn test_order_numbers_are_unique_and_prefixed() {
        let a = generate_order_number();
        let b = generate_order_number();
        assert!(a.starts_with("KR-"));
        assert_eq!(a.len(), "KR-261018-4F9A1C2B".len());
        assert_ne!(a, b);
    }
}
