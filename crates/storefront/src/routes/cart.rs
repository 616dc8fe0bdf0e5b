//! Cart route handlers.
//!
//! Every mutation responds with the full priced cart so the client never has
//! to recompute totals.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use kirana_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::cart::{CartService, CartView};
use crate::state::AppState;

/// Body of an add-to-cart request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// Body of a quantity change.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

async fn priced(state: &AppState, cart: &CartService<'_>) -> Result<Json<CartView>> {
    let settings = state.content().store_settings(state.pool()).await?;
    Ok(Json(cart.view(&settings.shipping_policy()).await?))
}

/// The customer's cart.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), customer.id);
    priced(&state, &cart).await
}

/// Add a product, merging with an existing line.
#[instrument(skip_all, fields(customer_id = %customer.id, product_id = %body.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), customer.id);
    cart.add(body.product_id, body.quantity).await?;
    priced(&state, &cart).await
}

/// Set a line's quantity.
#[instrument(skip_all, fields(customer_id = %customer.id, product_id = %product_id))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), customer.id);
    cart.update(product_id, body.quantity).await?;
    priced(&state, &cart).await
}

/// Remove a line.
#[instrument(skip_all, fields(customer_id = %customer.id, product_id = %product_id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), customer.id);
    cart.remove(product_id).await?;
    priced(&state, &cart).await
}

/// Empty the cart.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), customer.id);
    cart.clear().await?;
    priced(&state, &cart).await
}
