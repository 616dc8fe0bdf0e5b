//! Hero banner route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use kirana_core::HeroBannerId;

use crate::db::BannerRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::{HeroBanner, HeroBannerInput};
use crate::state::AppState;

/// Body of a reorder request: every banner id, in the new display order.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<HeroBannerId>,
}

/// All banners in display order, inactive ones included.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<HeroBanner>>> {
    let banners = BannerRepository::new(state.pool()).list_all().await?;
    Ok(Json(banners))
}

/// Add a banner at the end of the carousel.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<HeroBannerInput>,
) -> Result<(StatusCode, Json<HeroBanner>)> {
    input.validate()?;
    let banner = BannerRepository::new(state.pool()).create(&input).await?;
    info!(banner_id = %banner.id, "Hero banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

/// Replace a banner's content.
#[instrument(skip_all, fields(admin_id = %admin.id, banner_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<HeroBannerId>,
    Json(input): Json<HeroBannerInput>,
) -> Result<Json<HeroBanner>> {
    input.validate()?;
    let banner = BannerRepository::new(state.pool()).update(id, &input).await?;
    info!("Hero banner updated");
    Ok(Json(banner))
}

/// Flip a banner between active and inactive.
#[instrument(skip_all, fields(admin_id = %admin.id, banner_id = %id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<HeroBannerId>,
) -> Result<Json<HeroBanner>> {
    let banner = BannerRepository::new(state.pool()).toggle(id).await?;
    info!(is_active = banner.is_active, "Hero banner toggled");
    Ok(Json(banner))
}

/// Delete a banner.
#[instrument(skip_all, fields(admin_id = %admin.id, banner_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<HeroBannerId>,
) -> Result<StatusCode> {
    BannerRepository::new(state.pool()).delete(id).await?;
    info!("Hero banner deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a new display order in one transaction.
#[instrument(skip_all, fields(admin_id = %admin.id, count = body.ids.len()))]
pub async fn reorder(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Vec<HeroBanner>>> {
    let banners = BannerRepository::new(state.pool()).reorder(&body.ids).await?;
    info!("Hero banners reordered");
    Ok(Json(banners))
}
