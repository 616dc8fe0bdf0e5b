//! Store content route handlers: hero banners and the public store profile.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::BannerRepository;
use crate::error::Result;
use crate::models::{HeroBanner, StoreSettings};
use crate::state::AppState;

/// Active hero banners in display order, read fresh on every request.
#[instrument(skip(state))]
pub async fn hero_banners(State(state): State<AppState>) -> Result<Json<Vec<HeroBanner>>> {
    let banners = BannerRepository::new(state.pool()).list_active().await?;
    Ok(Json(banners))
}

/// Public store profile.
#[instrument(skip(state))]
pub async fn store_settings(State(state): State<AppState>) -> Result<Json<StoreSettings>> {
    let settings = state.content().store_settings(state.pool()).await?;
    Ok(Json(settings))
}
