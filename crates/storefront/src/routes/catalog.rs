//! Catalog route handlers: categories and products.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{ProductId, ProductSource};

use crate::db::CatalogRepository;
use crate::db::catalog::ProductFilter;
use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Search text.
    pub q: Option<String>,
    pub source: Option<ProductSource>,
    pub after: Option<i32>,
    pub limit: Option<u32>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            category: query.category.filter(|c| !c.trim().is_empty()),
            search: query.q,
            source: query.source,
            page: PageRequest {
                after: query.after,
                limit: query.limit,
            },
        }
    }
}

/// All categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// One page of products.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let page = CatalogRepository::new(state.pool())
        .list_products(&query.into())
        .await?;
    Ok(Json(page))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}
