//! Catalog reads: categories and active products.

use rust_decimal::Decimal;
use sqlx::PgPool;

use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{CategoryId, ProductId, ProductSource};

use super::RepositoryError;
use crate::models::{Category, CategoryRef, Product};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    partial_payment: bool,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            partial_payment: row.partial_payment,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i32,
    source: ProductSource,
    supplier_pid: Option<String>,
    name: String,
    description: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    images: Vec<String>,
    stock: Option<i32>,
    category_id: Option<i32>,
    category_name: Option<String>,
    category_slug: Option<String>,
    category_partial_payment: Option<bool>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_id, row.category_name, row.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef {
                id: CategoryId::new(id),
                name,
                slug,
                partial_payment: row.category_partial_payment.unwrap_or(false),
            }),
            _ => None,
        };

        Self {
            id: ProductId::new(row.id),
            source: row.source,
            pid: row.supplier_pid,
            name: row.name,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            images: row.images,
            category,
            stock: row.stock,
        }
    }
}

/// Columns read into [`ProductRow`]; `p` is the product, `c` its category.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.source, p.supplier_pid, p.name, \
     p.description, p.price, p.discount_price, p.images, p.stock, \
     c.id AS category_id, c.name AS category_name, c.slug AS category_slug, \
     c.partial_payment AS category_partial_payment";

pub(crate) const CATEGORY_JOIN: &str = "LEFT JOIN shop.category c ON c.id = p.category_id";

/// Filters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive substring of the name or description.
    pub search: Option<String>,
    pub source: Option<ProductSource>,
    pub page: PageRequest,
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, partial_payment FROM shop.category ORDER BY name, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// One page of active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, RepositoryError> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p {CATEGORY_JOIN} \
             WHERE p.is_active \
               AND ($1::INTEGER IS NULL OR p.id < $1) \
               AND ($2::TEXT IS NULL OR c.slug = $2) \
               AND ($3::TEXT IS NULL OR p.name ILIKE $3 OR p.description ILIKE $3) \
               AND ($4::shop.product_source IS NULL OR p.source = $4) \
             ORDER BY p.id DESC \
             LIMIT $5"
        ))
        .bind(filter.page.after)
        .bind(filter.category.as_deref())
        .bind(search)
        .bind(filter.source)
        .bind(filter.page.fetch_limit())
        .fetch_all(self.pool)
        .await?;

        let products: Vec<Product> = rows.into_iter().map(Product::from).collect();
        Ok(Page::from_overfetch(products, &filter.page, |p| p.id.as_i32()))
    }

    /// An active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p {CATEGORY_JOIN} \
             WHERE p.is_active AND p.id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50% off_now"), "50\\% off\\_now");
        assert_eq!(escape_like("basmati"), "basmati");
    }
}
