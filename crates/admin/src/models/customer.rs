//! Customer records for support and reporting.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kirana_core::{AddressId, AddressType, CustomerId};

use super::OrderSummary;

/// A customer with order totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    /// Orders placed, cancelled ones included.
    pub order_count: i64,
    /// Sum of paid orders.
    pub lifetime_spend: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A saved address, read-only here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub id: AddressId,
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone_number: String,
    pub address_type: AddressType,
    pub is_default: bool,
}

/// A customer with addresses and latest orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: CustomerSummary,
    pub addresses: Vec<CustomerAddress>,
    pub recent_orders: Vec<OrderSummary>,
}
