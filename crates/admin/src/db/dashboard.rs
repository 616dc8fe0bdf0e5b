//! Dashboard aggregates.

use rust_decimal::Decimal;
use sqlx::PgPool;

use kirana_core::ProductId;

use super::orders::status_counts;
use super::{CustomerRepository, RepositoryError};
use crate::models::dashboard::fill_status_counts;
use crate::models::{DashboardStats, LowStockProduct};

/// Tracked stock at or below this shows on the dashboard.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

const LOW_STOCK_LIMIT: i64 = 20;

/// Repository for dashboard figures.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Collect the dashboard figures.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        let counts = status_counts(self.pool).await?;
        let total_orders = counts.iter().map(|(_, c)| c).sum();

        let paid_revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM shop.customer_order WHERE payment_status = 'paid'",
        )
        .fetch_one(self.pool)
        .await?;

        let active_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.product WHERE is_active")
                .fetch_one(self.pool)
                .await?;

        let low_stock = sqlx::query_as::<_, (i32, String, i32)>(
            r"
            SELECT id, name, stock
            FROM shop.product
            WHERE is_active AND stock IS NOT NULL AND stock <= $1
            ORDER BY stock, name
            LIMIT $2
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .bind(LOW_STOCK_LIMIT)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|(id, name, stock)| LowStockProduct {
            id: ProductId::new(id),
            name,
            stock,
        })
        .collect();

        Ok(DashboardStats {
            orders_by_status: fill_status_counts(&counts),
            total_orders,
            paid_revenue,
            customer_count: CustomerRepository::new(self.pool).count().await?,
            active_products,
            low_stock,
        })
    }
}
