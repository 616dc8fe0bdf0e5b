//! Store content and payment gateway settings.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::db::SettingsRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireSuperAdmin, RequireWriter};
use crate::models::{RazorpaySettingsInput, RazorpaySettingsView, StoreSettings};
use crate::state::AppState;

/// Store profile and checkout policy.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn content(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<StoreSettings>> {
    let settings = SettingsRepository::new(state.pool()).store().await?;
    Ok(Json(settings))
}

/// Replace the store profile and checkout policy.
///
/// The storefront caches settings briefly, so changes show there within a
/// minute.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn update_content(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<StoreSettings>,
) -> Result<Json<StoreSettings>> {
    input.validate()?;
    let settings = SettingsRepository::new(state.pool())
        .update_store(&input)
        .await?;
    info!(cod_enabled = settings.cod_enabled, "Store settings updated");
    Ok(Json(settings))
}

/// Razorpay credentials with the secret masked.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn razorpay(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<RazorpaySettingsView>> {
    let settings = SettingsRepository::new(state.pool()).razorpay().await?;
    Ok(Json((&settings).into()))
}

/// Store Razorpay credentials.
///
/// An absent, blank or still-masked secret keeps the stored one.
#[instrument(skip_all, fields(admin_id = %admin.id, enabled = input.enabled))]
pub async fn update_razorpay(
    State(state): State<AppState>,
    RequireSuperAdmin(admin): RequireSuperAdmin,
    Json(input): Json<RazorpaySettingsInput>,
) -> Result<Json<RazorpaySettingsView>> {
    let repo = SettingsRepository::new(state.pool());
    let current = repo.razorpay().await?;
    let (key_id, key_secret) = input.resolve(&current.key_secret)?;

    let updated = repo
        .update_razorpay(&key_id, &key_secret, input.enabled)
        .await?;
    info!(enabled = updated.enabled, "Razorpay settings updated");
    Ok(Json((&updated).into()))
}
