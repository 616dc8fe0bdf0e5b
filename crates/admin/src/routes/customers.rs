//! Customer route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use kirana_core::CustomerId;
use kirana_core::pagination::{Page, PageRequest};

use crate::db::{CustomerRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{CustomerDetail, CustomerSummary};
use crate::state::AppState;

/// Orders shown on the customer detail.
const RECENT_ORDERS: i64 = 10;

/// Query string of the customer listing.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub after: Option<i32>,
    pub limit: Option<u32>,
}

/// Customers newest first with order totals.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<Page<CustomerSummary>>> {
    let page = PageRequest {
        after: query.after,
        limit: query.limit,
    };
    let customers = CustomerRepository::new(state.pool())
        .list(query.search.as_deref(), &page)
        .await?;
    Ok(Json(customers))
}

/// One customer with addresses and latest orders.
#[instrument(skip_all, fields(admin_id = %admin.id, customer_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CustomerId>,
) -> Result<Json<CustomerDetail>> {
    let customers = CustomerRepository::new(state.pool());
    let customer = customers
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;
    let addresses = customers.addresses(id).await?;
    let recent_orders = OrderRepository::new(state.pool())
        .recent_for_customer(id, RECENT_ORDERS)
        .await?;

    Ok(Json(CustomerDetail {
        customer,
        addresses,
        recent_orders,
    }))
}
