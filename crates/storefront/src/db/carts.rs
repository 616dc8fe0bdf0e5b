//! Persistent customer carts.

use sqlx::{PgConnection, PgPool};

use kirana_core::cart::PricedLine;
use kirana_core::{CustomerId, ProductId};

use super::RepositoryError;
use super::catalog::{CATEGORY_JOIN, PRODUCT_COLUMNS, ProductRow};
use crate::models::Product;

/// A cart line with the current product data.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    /// The product is still listed. Delisted products stay in carts until
    /// removed but cannot be ordered.
    pub available: bool,
}

impl CartLine {
    /// Price the line at the product's current price.
    #[must_use]
    pub fn priced(&self) -> PricedLine {
        PricedLine::new(
            self.product.id,
            self.product.name.clone(),
            self.product.thumbnail(),
            self.product.price,
            self.product.discount_price,
            self.quantity,
            self.product.allows_partial_payment(),
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    product: ProductRow,
    quantity: i32,
    is_active: bool,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative cart quantity: {}", row.quantity))
        })?;
        Ok(Self {
            product: row.product.into(),
            quantity,
            available: row.is_active,
        })
    }
}

/// Repository for cart items.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Lines of a customer's cart, oldest first. Inactive products are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, customer_id: CustomerId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let lines = load_lines(&mut conn, customer_id, false).await?;
        Ok(lines.into_iter().filter(|line| line.available).collect())
    }

    /// Quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_of(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<Option<u32>, RepositoryError> {
        let quantity: Option<i32> = sqlx::query_scalar(
            "SELECT quantity FROM shop.cart_item WHERE customer_id = $1 AND product_id = $2",
        )
        .bind(customer_id.as_i32())
        .bind(product_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity.and_then(|q| u32::try_from(q).ok()))
    }

    /// Set the quantity of a line, inserting it if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn set_quantity(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let quantity = i32::try_from(quantity)
            .map_err(|_| RepositoryError::Conflict("quantity out of range".to_owned()))?;

        sqlx::query(
            r"
            INSERT INTO shop.cart_item (customer_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(customer_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a line. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shop.cart_item WHERE customer_id = $1 AND product_id = $2")
                .bind(customer_id.as_i32())
                .bind(product_id.as_i32())
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, customer_id: CustomerId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        clear_on(&mut conn, customer_id).await
    }
}

/// Load cart lines on an open connection, delisted products included. With
/// `lock`, the cart rows and their products are locked until the transaction
/// ends.
pub(crate) async fn load_lines(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    lock: bool,
) -> Result<Vec<CartLine>, RepositoryError> {
    let lock_clause = if lock { "FOR UPDATE OF ci, p" } else { "" };
    let rows = sqlx::query_as::<_, CartLineRow>(&format!(
        "SELECT ci.quantity, p.is_active, {PRODUCT_COLUMNS} \
         FROM shop.cart_item ci \
         JOIN shop.product p ON p.id = ci.product_id \
         {CATEGORY_JOIN} \
         WHERE ci.customer_id = $1 \
         ORDER BY ci.added_at, p.id {lock_clause}"
    ))
    .bind(customer_id.as_i32())
    .fetch_all(conn)
    .await?;

    rows.into_iter().map(TryInto::try_into).collect()
}

pub(crate) async fn clear_on(
    conn: &mut PgConnection,
    customer_id: CustomerId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_item WHERE customer_id = $1")
        .bind(customer_id.as_i32())
        .execute(conn)
        .await?;
    Ok(())
}
