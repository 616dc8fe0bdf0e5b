//! Razorpay route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::db::{OrderRepository, SettingsRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::razorpay::{PaymentError, verify_payment_signature};
use crate::state::AppState;

/// Public gateway configuration for the checkout widget.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayKey {
    pub key_id: Option<String>,
    pub enabled: bool,
}

/// Fields Razorpay's checkout widget hands back after payment.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// The key id the browser needs to open the payment widget.
#[instrument(skip(state))]
pub async fn key(State(state): State<AppState>) -> Result<Json<RazorpayKey>> {
    let credentials = SettingsRepository::new(state.pool()).razorpay().await?;
    let enabled = credentials.is_usable();
    Ok(Json(RazorpayKey {
        key_id: enabled.then_some(credentials.key_id),
        enabled,
    }))
}

/// Verify a completed payment and mark the order paid.
#[instrument(
    skip_all,
    fields(customer_id = %customer.id, gateway_order_id = %body.razorpay_order_id)
)]
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<Json<Order>> {
    let orders = OrderRepository::new(state.pool());
    let order = orders
        .find_by_razorpay_order(customer.id, &body.razorpay_order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order for payment".to_string()))?;

    let credentials = SettingsRepository::new(state.pool()).razorpay().await?;
    if !credentials.is_usable() {
        return Err(PaymentError::NotConfigured.into());
    }

    if let Err(err) = verify_payment_signature(
        &credentials.key_secret,
        &body.razorpay_order_id,
        &body.razorpay_payment_id,
        &body.razorpay_signature,
    ) {
        warn!(order_number = %order.order_number, "Payment signature mismatch");
        orders.mark_payment_failed(order.id).await?;
        return Err(err.into());
    }

    let order = orders.mark_paid(order.id, &body.razorpay_payment_id).await?;
    info!(order_number = %order.order_number, "Payment verified");
    Ok(Json(order))
}
