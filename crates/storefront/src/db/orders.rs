//! Orders, their items and status timeline.
//!
//! Order placement runs in the caller's transaction through the free
//! functions at the bottom of this module; [`OrderRepository`] covers the
//! customer-facing reads and the state changes that follow placement.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use kirana_core::address::ShippingAddress;
use kirana_core::cart::{CartTotals, PaymentSplit, PricedLine};
use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{CustomerId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId};

use super::RepositoryError;
use crate::models::{Order, OrderEvent, OrderItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    order_number: String,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    subtotal: Decimal,
    shipping_fee: Decimal,
    total: Decimal,
    amount_due_now: Decimal,
    amount_due_on_delivery: Decimal,
    currency: String,
    shipping_address: Json<ShippingAddress>,
    razorpay_order_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: Option<i32>,
    name: String,
    image: Option<String>,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderEventRow {
    order_id: i32,
    status: OrderStatus,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>, timeline: Vec<OrderEvent>) -> Order {
        Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            status: self.status,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            items,
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            total: self.total,
            amount_due_now: self.amount_due_now,
            amount_due_on_delivery: self.amount_due_on_delivery,
            currency: self.currency,
            shipping_address: self.shipping_address.0,
            razorpay_order_id: self.razorpay_order_id,
            timeline,
            created_at: self.created_at,
        }
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id.map(ProductId::new),
            name: row.name,
            price: row.unit_price,
            quantity: row.quantity,
            image: row.image,
            line_total: row.line_total,
        }
    }
}

impl From<OrderEventRow> for OrderEvent {
    fn from(row: OrderEventRow) -> Self {
        Self {
            status: row.status,
            note: row.note,
            at: row.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, order_number, status, payment_method, payment_status, \
     subtotal, shipping_fee, total, amount_due_now, amount_due_on_delivery, currency, \
     shipping_address, razorpay_order_id, created_at";

/// Unique constraint guarding one order per customer and idempotency key.
const IDEMPOTENCY_CONSTRAINT: &str = "customer_order_idempotency_key_unique";

// =============================================================================
// Repository
// =============================================================================

/// Repository for a customer's orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        page: &PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order \
             WHERE customer_id = $1 AND ($2::INTEGER IS NULL OR id < $2) \
             ORDER BY id DESC \
             LIMIT $3"
        ))
        .bind(customer_id.as_i32())
        .bind(page.after)
        .bind(page.fetch_limit())
        .fetch_all(self.pool)
        .await?;

        let page = Page::from_overfetch(rows, page, |row| row.id);
        let mut conn = self.pool.acquire().await?;
        let orders = attach_details(&mut conn, page.items).await?;
        Ok(Page {
            items: orders,
            next_cursor: page.next_cursor,
        })
    }

    /// One of the customer's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_customer(
        &self,
        customer_id: CustomerId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let order = load(&mut conn, id).await?;
        Ok(order.filter(|(owner, _)| *owner == customer_id).map(|(_, order)| order))
    }

    /// The order a customer placed with an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_idempotency_key(
        &self,
        customer_id: CustomerId,
        key: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_by_idempotency_key_on(&mut conn, customer_id, key).await
    }

    /// The customer's order paid through a gateway order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_razorpay_order(
        &self,
        customer_id: CustomerId,
        razorpay_order_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let id: Option<i32> = sqlx::query_scalar(
            "SELECT id FROM shop.customer_order WHERE customer_id = $1 AND razorpay_order_id = $2",
        )
        .bind(customer_id.as_i32())
        .bind(razorpay_order_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(id) = id else {
            return Ok(None);
        };
        self.get_for_customer(customer_id, OrderId::new(id)).await
    }

    /// Cancel one of the customer's orders and put tracked stock back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is not the customer's,
    /// `RepositoryError::Conflict` if it can no longer be cancelled.
    pub async fn cancel(
        &self,
        customer_id: CustomerId,
        id: OrderId,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (owner, status) = lock_status(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        if owner != customer_id {
            return Err(RepositoryError::NotFound);
        }
        if !status.is_cancellable() {
            return Err(RepositoryError::Conflict(format!(
                "order is {status} and can no longer be cancelled"
            )));
        }

        set_status(&mut tx, id, OrderStatus::Cancelled, Some("Cancelled by customer")).await?;
        restore_stock(&mut tx, id).await?;

        let (_, order) = load(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(order)
    }

    /// Record a verified online payment: the order becomes paid and, if it was
    /// still placed, confirmed.
    ///
    /// Repeating the call for an already paid order changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn mark_paid(&self, id: OrderId, payment_id: &str) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (_, status) = lock_status(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        let updated = sqlx::query(
            r"
            UPDATE shop.customer_order
            SET payment_status = 'paid', razorpay_payment_id = $2, updated_at = NOW()
            WHERE id = $1 AND payment_status <> 'paid'
            ",
        )
        .bind(id.as_i32())
        .bind(payment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated > 0 && status == OrderStatus::Placed {
            set_status(&mut tx, id, OrderStatus::Confirmed, Some("Payment received")).await?;
        }

        let (_, order) = load(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(order)
    }

    /// Record a failed payment attempt. Paid orders are left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_payment_failed(&self, id: OrderId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE shop.customer_order
            SET payment_status = 'failed', updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending'
            ",
        )
        .bind(id.as_i32())
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Everything needed to write a new order.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub customer_id: CustomerId,
    pub payment_method: PaymentMethod,
    pub lines: &'a [PricedLine],
    pub totals: CartTotals,
    pub split: PaymentSplit,
    pub shipping_address: &'a ShippingAddress,
    pub currency: &'a str,
    pub idempotency_key: Option<&'a str>,
    pub razorpay_order_id: Option<&'a str>,
}

/// Serialize placements for one customer until the transaction ends.
///
/// Two placements with the same idempotency key then see each other's order
/// instead of racing for the same cart.
pub(crate) async fn lock_placement(
    conn: &mut PgConnection,
    customer_id: CustomerId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext('shop.checkout'), $1)")
        .bind(customer_id.as_i32())
        .execute(conn)
        .await?;
    Ok(())
}

/// The order a customer placed with an idempotency key, on an open connection.
pub(crate) async fn find_by_idempotency_key_on(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    key: &str,
) -> Result<Option<Order>, RepositoryError> {
    let id: Option<i32> = sqlx::query_scalar(
        "SELECT id FROM shop.customer_order WHERE customer_id = $1 AND idempotency_key = $2",
    )
    .bind(customer_id.as_i32())
    .bind(key)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(id) = id else {
        return Ok(None);
    };
    Ok(load(conn, OrderId::new(id)).await?.map(|(_, order)| order))
}

/// Write an order, its items and the first timeline event.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the idempotency key was already
/// used. Any other unique violation is a `RepositoryError::Database`.
pub(crate) async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder<'_>,
) -> Result<OrderId, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO shop.customer_order
            (order_number, customer_id, payment_method, subtotal, shipping_fee, total,
             amount_due_now, amount_due_on_delivery, currency, shipping_address,
             idempotency_key, razorpay_order_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        ",
    )
    .bind(order.order_number)
    .bind(order.customer_id.as_i32())
    .bind(order.payment_method)
    .bind(order.totals.subtotal)
    .bind(order.totals.shipping_fee)
    .bind(order.totals.total)
    .bind(order.split.due_now)
    .bind(order.split.due_on_delivery)
    .bind(order.currency)
    .bind(Json(order.shipping_address))
    .bind(order.idempotency_key)
    .bind(order.razorpay_order_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_insert_error)?;
    let order_id = OrderId::new(id);

    for line in order.lines {
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("quantity out of range: {}", line.quantity))
        })?;
        sqlx::query(
            r"
            INSERT INTO shop.order_item
                (order_id, product_id, name, image, unit_price, quantity, line_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(id)
        .bind(line.product_id.as_i32())
        .bind(&line.name)
        .bind(line.image.as_deref())
        .bind(line.unit_price)
        .bind(quantity)
        .bind(line.line_total)
        .execute(&mut *conn)
        .await?;
    }

    insert_event(conn, order_id, OrderStatus::Placed, None).await?;
    Ok(order_id)
}

fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
        && db_err.constraint() == Some(IDEMPOTENCY_CONSTRAINT)
    {
        return RepositoryError::Conflict("order already placed".to_owned());
    }
    RepositoryError::Database(err)
}

/// Take units out of tracked stock. Returns `false` when not enough is left;
/// untracked products always succeed.
pub(crate) async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: u32,
) -> Result<bool, RepositoryError> {
    let quantity = i32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("quantity out of range: {quantity}")))?;
    let result = sqlx::query(
        r"
        UPDATE shop.product
        SET stock = CASE WHEN stock IS NULL THEN NULL ELSE stock - $2 END, updated_at = NOW()
        WHERE id = $1 AND (stock IS NULL OR stock >= $2)
        ",
    )
    .bind(product_id.as_i32())
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Put an order's quantities back into tracked stock.
pub(crate) async fn restore_stock(conn: &mut PgConnection, id: OrderId) -> Result<(), RepositoryError> {
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

async fn insert_event(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
    note: Option<&str>,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO shop.order_event (order_id, status, note) VALUES ($1, $2, $3)")
        .bind(id.as_i32())
        .bind(status)
        .bind(note)
        .execute(conn)
        .await?;
    Ok(())
}

async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
    note: Option<&str>,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.customer_order SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id.as_i32())
        .bind(status)
        .execute(&mut *conn)
        .await?;
    insert_event(conn, id, status, note).await
}

/// Lock an order row and return its owner and status.
async fn lock_status(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<(CustomerId, OrderStatus)>, RepositoryError> {
    let row: Option<(i32, OrderStatus)> = sqlx::query_as(
        "SELECT customer_id, status FROM shop.customer_order WHERE id = $1 FOR UPDATE",
    )
    .bind(id.as_i32())
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(owner, status)| (CustomerId::new(owner), status)))
}

/// Load an order with items and timeline, along with its owner.
pub(crate) async fn load(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<(CustomerId, Order)>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1"
    ))
    .bind(id.as_i32())
    .fetch_optional(&mut *conn)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let owner = CustomerId::new(row.customer_id);
    let order = attach_details(conn, vec![row]).await?.pop().ok_or(RepositoryError::NotFound)?;
    Ok(Some((owner, order)))
}

/// Fetch items and timeline events for a batch of orders, keeping row order.
async fn attach_details(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<Order>, RepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT order_id, product_id, name, image, unit_price, quantity, line_total
        FROM shop.order_item
        WHERE order_id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let event_rows = sqlx::query_as::<_, OrderEventRow>(
        r"
        SELECT order_id, status, note, created_at
        FROM shop.order_event
        WHERE order_id = ANY($1)
        ORDER BY created_at, id
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut items: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        items.entry(row.order_id).or_default().push(row.into());
    }
    let mut events: HashMap<i32, Vec<OrderEvent>> = HashMap::new();
    for row in event_rows {
        events.entry(row.order_id).or_default().push(row.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            row.into_order(
                items.remove(&id).unwrap_or_default(),
                events.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::fmt;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct UniqueViolation(&'static str);

    impl fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"{}\"", self.0)
        }
    }

    impl StdError for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.0)
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    fn violation(constraint: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(UniqueViolation(constraint)))
    }

    #[test]
    fn idempotency_key_collision_is_a_conflict() {
        assert!(matches!(
            map_insert_error(violation(IDEMPOTENCY_CONSTRAINT)),
            RepositoryError::Conflict(_)
        ));
    }

    #[test]
    fn other_unique_violations_stay_database_errors() {
        for constraint in [
            "customer_order_order_number_key",
            "customer_order_razorpay_order_id_key",
        ] {
            assert!(matches!(
                map_insert_error(violation(constraint)),
                RepositoryError::Database(_)
            ));
        }
        assert!(matches!(
            map_insert_error(sqlx::Error::RowNotFound),
            RepositoryError::Database(_)
        ));
    }
}
