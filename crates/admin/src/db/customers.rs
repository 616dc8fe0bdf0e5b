//! Customer lookup for the admin console. Read-only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use kirana_core::pagination::{Page, PageRequest};
use kirana_core::{AddressId, AddressType, CustomerId};

use super::{RepositoryError, search_pattern};
use crate::models::{CustomerAddress, CustomerSummary};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    full_name: String,
    phone_number: Option<String>,
    order_count: i64,
    lifetime_spend: Decimal,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for CustomerSummary {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            email: row.email,
            full_name: row.full_name,
            phone_number: row.phone_number,
            order_count: row.order_count,
            lifetime_spend: row.lifetime_spend,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    full_name: String,
    street: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    phone_number: String,
    address_type: AddressType,
    is_default: bool,
}

impl From<AddressRow> for CustomerAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            full_name: row.full_name,
            street: row.street,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            country: row.country,
            phone_number: row.phone_number,
            address_type: row.address_type,
            is_default: row.is_default,
        }
    }
}

const CUSTOMER_SELECT: &str = "SELECT c.id, c.email, c.full_name, c.phone_number, c.created_at, \
     COUNT(o.id) AS order_count, \
     COALESCE(SUM(o.total) FILTER (WHERE o.payment_status = 'paid'), 0) AS lifetime_spend \
     FROM shop.customer c LEFT JOIN shop.customer_order o ON o.customer_id = c.id";

/// Repository for customer lookup.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Customers newest first, optionally matching a name, email or phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<CustomerSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "{CUSTOMER_SELECT} \
             WHERE ($1::INTEGER IS NULL OR c.id < $1) \
               AND ($2::TEXT IS NULL OR c.full_name ILIKE $2 OR c.email ILIKE $2 \
                    OR c.phone_number ILIKE $2) \
             GROUP BY c.id \
             ORDER BY c.id DESC \
             LIMIT $3"
        ))
        .bind(page.after)
        .bind(search_pattern(search))
        .bind(page.fetch_limit())
        .fetch_all(self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, page, |row| row.id).map(Into::into))
    }

    /// One customer with order totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<CustomerSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "{CUSTOMER_SELECT} WHERE c.id = $1 GROUP BY c.id"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// A customer's saved addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn addresses(&self, id: CustomerId) -> Result<Vec<CustomerAddress>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, full_name, street, city, state, zip_code, country,
                   phone_number, address_type, is_default
            FROM shop.address
            WHERE customer_id = $1
            ORDER BY is_default DESC, updated_at DESC, id DESC
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Number of registered customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM shop.customer")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
