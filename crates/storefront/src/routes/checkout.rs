//! Checkout route handlers: the wizard summary and order placement.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use kirana_core::checkout::CheckoutRequest;

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::checkout::{CheckoutService, CheckoutSummary, PlacedOrder};
use crate::state::AppState;

/// Cart, addresses and payment options for the checkout wizard.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<CheckoutSummary>> {
    let settings = state.content().store_settings(state.pool()).await?;
    let credentials = SettingsRepository::new(state.pool()).razorpay().await?;

    let summary = CheckoutService::new(state.pool(), state.razorpay(), customer.id)
        .summary(&settings, &credentials)
        .await?;
    Ok(Json(summary))
}

/// Place an order from the cart.
///
/// Responds `201 Created` for a new order and `200 OK` when the idempotency
/// key matched an existing one.
#[instrument(skip_all, fields(customer_id = %customer.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    // Fresh settings: placement must charge what the admin configured now.
    let settings_repo = SettingsRepository::new(state.pool());
    let settings = settings_repo.store().await?;
    let credentials = settings_repo.razorpay().await?;

    let placed = CheckoutService::new(state.pool(), state.razorpay(), customer.id)
        .place(&request, &settings, &credentials)
        .await?;

    let status = if placed.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(placed)))
}
