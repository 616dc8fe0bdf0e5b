//! Cart operations.
//!
//! Quantities are validated against the per-line cap and tracked stock before
//! anything is written; the cart is then re-read and priced so every response
//! carries current totals.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use kirana_core::cart::{self, CartTotals, PricedLine, ShippingPolicy, price_cart};
use kirana_core::{CustomerId, ProductId};

use crate::db::carts::CartLine;
use crate::db::{CartRepository, CatalogRepository, RepositoryError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// Quantity or stock rule broken.
    #[error(transparent)]
    Rule(#[from] cart::CartError),

    /// Product missing or inactive.
    #[error("product not found")]
    ProductNotFound,

    /// Line not in the cart.
    #[error("item not in cart")]
    LineNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A priced cart as returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<PricedLine>,
    #[serde(flatten)]
    pub totals: CartTotals,
}

impl CartView {
    /// Price cart lines with the store's shipping policy.
    #[must_use]
    pub fn from_lines(lines: &[CartLine], shipping: &ShippingPolicy) -> Self {
        let items: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
        let totals = price_cart(&items, shipping);
        Self { items, totals }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart operations for one customer.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    catalog: CatalogRepository<'a>,
    customer_id: CustomerId,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, customer_id: CustomerId) -> Self {
        Self {
            carts: CartRepository::new(pool),
            catalog: CatalogRepository::new(pool),
            customer_id,
        }
    }

    /// The current cart, priced.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the cart cannot be read.
    pub async fn view(&self, shipping: &ShippingPolicy) -> Result<CartView, CartServiceError> {
        let lines = self.carts.lines(self.customer_id).await?;
        Ok(CartView::from_lines(&lines, shipping))
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ProductNotFound` for unknown products and
    /// `CartServiceError::Rule` when the quantity or stock rules are broken.
    pub async fn add(&self, product_id: ProductId, quantity: i64) -> Result<(), CartServiceError> {
        let quantity = cart::validate_quantity(quantity)?;
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or(CartServiceError::ProductNotFound)?;

        let existing = self
            .carts
            .quantity_of(self.customer_id, product_id)
            .await?
            .unwrap_or(0);
        let combined = cart::combined_quantity(existing, quantity)?;
        cart::check_stock(combined, product.stock)?;

        self.carts
            .set_quantity(self.customer_id, product_id, combined)
            .await?;
        Ok(())
    }

    /// Replace the quantity of a line already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::LineNotFound` if the product is not in the cart.
    pub async fn update(&self, product_id: ProductId, quantity: i64) -> Result<(), CartServiceError> {
        let quantity = cart::validate_quantity(quantity)?;
        if self
            .carts
            .quantity_of(self.customer_id, product_id)
            .await?
            .is_none()
        {
            return Err(CartServiceError::LineNotFound);
        }
        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or(CartServiceError::ProductNotFound)?;
        cart::check_stock(quantity, product.stock)?;

        self.carts
            .set_quantity(self.customer_id, product_id, quantity)
            .await?;
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::LineNotFound` if the product is not in the cart.
    pub async fn remove(&self, product_id: ProductId) -> Result<(), CartServiceError> {
        if !self.carts.remove(self.customer_id, product_id).await? {
            return Err(CartServiceError::LineNotFound);
        }
        Ok(())
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the delete fails.
    pub async fn clear(&self) -> Result<(), CartServiceError> {
        self.carts.clear(self.customer_id).await?;
        Ok(())
    }
}
