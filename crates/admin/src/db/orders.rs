//! Order management: listing, detail and status changes.
//!
//! Status changes run in one transaction that locks the order row, checks the
//! move against [`OrderStatus::can_transition_to`], appends a timeline event
//! and, for cancellations, returns tracked stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use kirana_core::address::ShippingAddress;
use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{CustomerId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId};

use super::{RepositoryError, search_pattern};
use crate::models::{OrderDetail, OrderEvent, OrderItem, OrderSummary, StatusChange};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: i32,
    order_number: String,
    customer_id: i32,
    customer_name: String,
    customer_email: String,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    total: Decimal,
    item_count: i64,
    created_at: DateTime<Utc>,
}

impl From<SummaryRow> for OrderSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            customer_id: CustomerId::new(row.customer_id),
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            status: row.status,
            payment_method: row.payment_method,
            payment_status: row.payment_status,
            total: row.total,
            item_count: row.item_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DetailRow {
    #[sqlx(flatten)]
    summary: SummaryRow,
    subtotal: Decimal,
    shipping_fee: Decimal,
    amount_due_now: Decimal,
    amount_due_on_delivery: Decimal,
    shipping_address: Json<ShippingAddress>,
    razorpay_order_id: Option<String>,
    razorpay_payment_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    product_id: Option<i32>,
    name: String,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        Self {
            product_id: row.product_id.map(ProductId::new),
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            line_total: row.line_total,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    status: OrderStatus,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for OrderEvent {
    fn from(row: EventRow) -> Self {
        Self {
            status: row.status,
            note: row.note,
            at: row.created_at,
        }
    }
}

const SUMMARY_SELECT: &str = "SELECT o.id, o.order_number, o.customer_id, \
     c.full_name AS customer_name, c.email AS customer_email, \
     o.status, o.payment_method, o.payment_status, o.total, o.created_at, \
     (SELECT COALESCE(SUM(i.quantity), 0) FROM shop.order_item i WHERE i.order_id = o.id)::BIGINT AS item_count";

const SUMMARY_FROM: &str =
    "FROM shop.customer_order o JOIN shop.customer c ON c.id = o.customer_id";

/// Filters for the admin order list.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order number, customer name or email.
    pub search: Option<String>,
    pub page: PageRequest,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order management.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Page<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            "{SUMMARY_SELECT} {SUMMARY_FROM} \
             WHERE ($1::INTEGER IS NULL OR o.id < $1) \
               AND ($2::shop.order_status IS NULL OR o.status = $2) \
               AND ($3::TEXT IS NULL OR o.order_number ILIKE $3 \
                    OR c.full_name ILIKE $3 OR c.email ILIKE $3) \
             ORDER BY o.id DESC \
             LIMIT $4"
        ))
        .bind(filter.page.after)
        .bind(filter.status)
        .bind(search_pattern(filter.search.as_deref()))
        .bind(filter.page.fetch_limit())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, &filter.page, |row| row.id).map(Into::into))
    }

    /// A customer's latest orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_for_customer(
        &self,
        customer_id: CustomerId,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            "{SUMMARY_SELECT} {SUMMARY_FROM} WHERE o.customer_id = $1 ORDER BY o.id DESC LIMIT $2"
        ))
        .bind(customer_id.as_i32())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// An order with items and timeline.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load(&mut conn, id).await
    }

    /// Move an order to a new status.
    ///
    /// Cancelling returns tracked stock. Delivering a cash on delivery order
    /// marks it paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist,
    /// `RepositoryError::Conflict` if the move is not allowed.
    pub async fn change_status(
        &self,
        id: OrderId,
        change: &StatusChange,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (current, payment_method): (OrderStatus, PaymentMethod) = sqlx::query_as(
            "SELECT status, payment_method FROM shop.customer_order WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(change.status) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {current} to {}",
                change.status
            )));
        }

        sqlx::query("UPDATE shop.customer_order SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .bind(change.status)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO shop.order_event (order_id, status, note) VALUES ($1, $2, $3)")
            .bind(id.as_i32())
            .bind(change.status)
            .bind(change.note())
            .execute(&mut *tx)
            .await?;

        match change.status {
            OrderStatus::Cancelled => restore_stock(&mut tx, id).await?,
            OrderStatus::Delivered if payment_method == PaymentMethod::CashOnDelivery => {
                sqlx::query(
                    "UPDATE shop.customer_order SET payment_status = 'paid' \
                     WHERE id = $1 AND payment_status = 'pending'",
                )
                .bind(id.as_i32())
                .execute(&mut *tx)
                .await?;
            }
            _ => {}
        }

        let order = load(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(order)
    }
}

/// Put an order's quantities back into tracked stock.
async fn restore_stock(conn: &mut PgConnection, id: OrderId) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.product p
        SET stock = p.stock + i.quantity, updated_at = NOW()
        FROM (
            SELECT product_id, SUM(quantity)::INTEGER AS quantity
            FROM shop.order_item
            WHERE order_id = $1 AND product_id IS NOT NULL
            GROUP BY product_id
        ) i
        WHERE p.id = i.product_id AND p.stock IS NOT NULL
        ",
    )
    .bind(id.as_i32())
    .execute(conn)
    .await?;
    Ok(())
}

async fn load(conn: &mut PgConnection, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
    let row = sqlx::query_as::<_, DetailRow>(&format!(
        "{SUMMARY_SELECT}, o.subtotal, o.shipping_fee, o.amount_due_now, \
         o.amount_due_on_delivery, o.shipping_address, o.razorpay_order_id, \
         o.razorpay_payment_id \
         {SUMMARY_FROM} WHERE o.id = $1"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, ItemRow>(
        r"
        SELECT product_id, name, unit_price, quantity, line_total
        FROM shop.order_item
        WHERE order_id = $1
        ORDER BY id
        ",
    )
    .bind(id.as_i32())
    .fetch_all(&mut *conn)
    .await?;

    let events = sqlx::query_as::<_, EventRow>(
        r"
        SELECT status, note, created_at
        FROM shop.order_event
        WHERE order_id = $1
        ORDER BY created_at, id
        ",
    )
    .bind(id.as_i32())
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(OrderDetail {
        summary: row.summary.into(),
        items: items.into_iter().map(Into::into).collect(),
        subtotal: row.subtotal,
        shipping_fee: row.shipping_fee,
        amount_due_now: row.amount_due_now,
        amount_due_on_delivery: row.amount_due_on_delivery,
        shipping_address: row.shipping_address.0,
        razorpay_order_id: row.razorpay_order_id,
        razorpay_payment_id: row.razorpay_payment_id,
        timeline: events.into_iter().map(Into::into).collect(),
    }))
}

/// Count orders per status.
pub(crate) async fn status_counts(pool: &PgPool) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
    let rows = sqlx::query_as::<_, (OrderStatus, i64)>(
        "SELECT status, COUNT(*) FROM shop.customer_order GROUP BY status",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
