//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use kirana_core::CategoryId;

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::{Category, CategoryInput};
use crate::state::AppState;

/// All categories with product counts.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// Add a category.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    input.validate()?;
    let category = CatalogRepository::new(state.pool())
        .create_category(&input)
        .await?;
    info!(category_id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename a category or change its partial-payment flag.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    input.validate()?;
    let category = CatalogRepository::new(state.pool())
        .update_category(id, &input)
        .await?;
    info!(partial_payment = category.partial_payment, "Category updated");
    Ok(Json(category))
}

/// Delete a category. Its products become uncategorised.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool()).delete_category(id).await?;
    info!("Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
