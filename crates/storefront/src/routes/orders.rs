//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{info, instrument};

use kirana_core::OrderId;
use kirana_core::pagination::{Page, PageRequest};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::state::AppState;

/// The customer's orders, newest first.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(customer.id, &page)
        .await?;
    Ok(Json(orders))
}

/// One of the customer's orders with items and timeline.
#[instrument(skip_all, fields(customer_id = %customer.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_for_customer(customer.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Cancel an order that has not shipped.
#[instrument(skip_all, fields(customer_id = %customer.id, order_id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .cancel(customer.id, id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("order {id}")),
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Database(other),
        })?;
    info!(order_number = %order.order_number, "Order cancelled by customer");
    Ok(Json(order))
}
