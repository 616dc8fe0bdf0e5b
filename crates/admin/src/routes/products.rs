//! Product management route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};

use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{CategoryId, ProductId, ProductSource, ValidationErrors};

use crate::db::{CatalogRepository, ProductFilter};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::models::{Product, ProductInput};
use crate::state::AppState;

/// Query string of the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub source: Option<ProductSource>,
    pub after: Option<i32>,
    pub limit: Option<u32>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            search: query.search,
            category: query.category,
            source: query.source,
            page: PageRequest {
                after: query.after,
                limit: query.limit,
            },
        }
    }
}

/// Body of a stock update. `null` stops tracking stock.
#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub stock: Option<i32>,
}

/// Products newest first, active and inactive.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let products = CatalogRepository::new(state.pool())
        .list_products(&query.into())
        .await?;
    Ok(Json(products))
}

/// One product.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}

/// Add a product.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    input.validate()?;
    let product = CatalogRepository::new(state.pool())
        .create_product(&input)
        .await?;
    info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    input.validate()?;
    let product = CatalogRepository::new(state.pool())
        .update_product(id, &input)
        .await?;
    info!("Product updated");
    Ok(Json(product))
}

/// Set or clear tracked stock.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn set_stock(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
    Json(body): Json<StockUpdate>,
) -> Result<Json<Product>> {
    if body.stock.is_some_and(|s| s < 0) {
        let mut errors = ValidationErrors::new();
        errors.add("stock", "cannot be negative");
        return Err(errors.into());
    }
    let product = CatalogRepository::new(state.pool())
        .set_stock(id, body.stock)
        .await?;
    info!(stock = ?product.stock, "Stock updated");
    Ok(Json(product))
}

/// Delete a product. Past orders keep their item snapshots.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    CatalogRepository::new(state.pool()).delete_product(id).await?;
    info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
