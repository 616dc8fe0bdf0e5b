//! Order management route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::{info, instrument};

use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{OrderId, OrderStatus};

use crate::db::{OrderFilter, OrderRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::{OrderDetail, OrderSummary, StatusChange};
use crate::state::AppState;

/// Query string of the order listing.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Order number, customer name or email.
    pub search: Option<String>,
    pub after: Option<i32>,
    pub limit: Option<u32>,
}

impl From<OrderQuery> for OrderFilter {
    fn from(query: OrderQuery) -> Self {
        Self {
            status: query.status,
            search: query.search,
            page: PageRequest {
                after: query.after,
                limit: query.limit,
            },
        }
    }
}

/// Orders newest first.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool()).list(&query.into()).await?;
    Ok(Json(orders))
}

/// One order with items, address and timeline.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Move an order to its next status.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id, status = %change.status))]
pub async fn change_status(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<OrderId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<OrderDetail>> {
    let order = OrderRepository::new(state.pool())
        .change_status(id, &change)
        .await?;
    info!(
        order_number = %order.summary.order_number,
        payment_status = ?order.summary.payment_status,
        "Order status changed"
    );
    Ok(Json(order))
}
