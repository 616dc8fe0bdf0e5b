//! Dashboard figures.

use rust_decimal::Decimal;
use serde::Serialize;

use kirana_core::{OrderStatus, ProductId};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// One entry per status, zero counts included.
    pub orders_by_status: Vec<StatusCount>,
    pub total_orders: i64,
    /// Sum of paid orders.
    pub paid_revenue: Decimal,
    pub customer_count: i64,
    pub active_products: i64,
    pub low_stock: Vec<LowStockProduct>,
}

/// Number of orders currently in a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// An active product at or under the low-stock threshold.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub stock: i32,
}

/// Expand counts from a `GROUP BY status` query to every status.
#[must_use]
pub fn fill_status_counts(counts: &[(OrderStatus, i64)]) -> Vec<StatusCount> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: counts
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, c)| *c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_statuses_count_zero() {
        let filled = fill_status_counts(&[(OrderStatus::Shipped, 3), (OrderStatus::Placed, 7)]);
        assert_eq!(filled.len(), OrderStatus::ALL.len());
        assert_eq!(filled[0], StatusCount { status: OrderStatus::Placed, count: 7 });
        assert_eq!(filled[1].count, 0);
        assert_eq!(filled[2].count, 3);
        assert_eq!(filled.iter().map(|s| s.count).sum::<i64>(), 10);
    }
}
