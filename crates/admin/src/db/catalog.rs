//! Categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{CategoryId, ProductId, ProductSource};

use super::{RepositoryError, search_pattern};
use crate::models::{Category, CategoryInput, Product, ProductInput};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    partial_payment: bool,
    product_count: i64,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            partial_payment: row.partial_payment,
            product_count: row.product_count,
            created_at: row.created_at,
        }
    }
}

const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.slug, c.partial_payment, c.created_at, \
     (SELECT COUNT(*) FROM shop.product p WHERE p.category_id = c.id) AS product_count \
     FROM shop.category c";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    source: ProductSource,
    supplier_pid: Option<String>,
    name: String,
    description: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    images: Vec<String>,
    category_id: Option<i32>,
    category_name: Option<String>,
    stock: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            source: row.source,
            supplier_pid: row.supplier_pid,
            name: row.name,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            images: row.images,
            category_id: row.category_id.map(CategoryId::new),
            category_name: row.category_name,
            stock: row.stock,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_SELECT: &str = "SELECT p.id, p.source, p.supplier_pid, p.name, p.description, \
     p.price, p.discount_price, p.images, p.category_id, c.name AS category_name, \
     p.stock, p.is_active, p.created_at, p.updated_at \
     FROM shop.product p LEFT JOIN shop.category c ON c.id = p.category_id";

/// Filters for the admin product list.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub source: Option<ProductSource>,
    pub page: PageRequest,
}

/// Repository for the catalog.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} ORDER BY c.name"))
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Create a category. The input must already be validated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.category (name, slug, partial_payment) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(input.name.trim())
        .bind(input.slug())
        .bind(input.partial_payment)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "slug already in use"))?;

        self.get_category(CategoryId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist,
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.category SET name = $2, slug = $3, partial_payment = $4 WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(input.name.trim())
        .bind(input.slug())
        .bind(input.partial_payment)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "slug already in use"))?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_category(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category. Its products become uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Products newest first, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} \
             WHERE ($1::INTEGER IS NULL OR p.id < $1) \
               AND ($2::INTEGER IS NULL OR p.category_id = $2) \
               AND ($3::shop.product_source IS NULL OR p.source = $3) \
               AND ($4::TEXT IS NULL OR p.name ILIKE $4 OR p.supplier_pid ILIKE $4) \
             ORDER BY p.id DESC \
             LIMIT $5"
        ))
        .bind(filter.page.after)
        .bind(filter.category.map(|c| c.as_i32()))
        .bind(filter.source)
        .bind(search_pattern(filter.search.as_deref()))
        .bind(filter.page.fetch_limit())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, &filter.page, |row| row.id).map(Into::into))
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Create a product. The input must already be validated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the supplier id is already listed.
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product
                (source, supplier_pid, name, description, price, discount_price,
                 images, category_id, stock, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            ",
        )
        .bind(input.source)
        .bind(input.supplier_pid())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(&input.images)
        .bind(input.category_id.map(|c| c.as_i32()))
        .bind(input.stock)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(product_write_error)?;

        self.get_product(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE shop.product SET
                source = $2, supplier_pid = $3, name = $4, description = $5,
                price = $6, discount_price = $7, images = $8, category_id = $9,
                stock = $10, is_active = $11, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(input.source)
        .bind(input.supplier_pid())
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_price)
        .bind(&input.images)
        .bind(input.category_id.map(|c| c.as_i32()))
        .bind(input.stock)
        .bind(input.is_active)
        .execute(self.pool)
        .await
        .map_err(product_write_error)?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Set tracked stock, or stop tracking it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_stock(&self, id: ProductId, stock: Option<i32>) -> Result<Product, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE shop.product SET stock = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(stock)
        .execute(self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Past order lines keep their copied name and price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Unique supplier ids and unknown categories are client mistakes.
fn product_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict("category does not exist".to_string());
    }
    RepositoryError::from_unique_violation(err, "supplier product already listed")
}
