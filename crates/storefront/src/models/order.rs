//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kirana_core::address::ShippingAddress;
use kirana_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId};

/// A placed order with its items and status history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub amount_due_now: Decimal,
    pub amount_due_on_delivery: Decimal,
    /// ISO code of the currency the order was priced in.
    pub currency: String,
    pub shipping_address: ShippingAddress,
    pub razorpay_order_id: Option<String>,
    /// Status changes, oldest first.
    pub timeline: Vec<OrderEvent>,
    pub created_at: DateTime<Utc>,
}

/// A purchased line, priced at the time of the order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub image: Option<String>,
    pub line_total: Decimal,
}

/// One entry of an order's status history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}
