//! Saved shipping addresses.
//!
//! A customer with any addresses always has exactly one default: the first
//! address saved becomes the default, and deleting the default promotes the
//! most recently updated remaining address.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use kirana_core::address::AddressInput;
use kirana_core::{AddressId, AddressType, CustomerId};

use super::RepositoryError;
use crate::models::Address;

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
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
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
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ADDRESS_COLUMNS: &str = "id, full_name, street, city, state, zip_code, country, \
     phone_number, address_type, is_default, created_at, updated_at";

/// Repository for the customer address book.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a customer's addresses, default first, then newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, customer_id: CustomerId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address \
             WHERE customer_id = $1 \
             ORDER BY is_default DESC, updated_at DESC, id DESC"
        ))
        .bind(customer_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get one of a customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_owned(&mut conn, customer_id, id).await
    }

    /// Save a new address. The input must already be validated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        customer_id: CustomerId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let address = insert(&mut tx, customer_id, input).await?;
        tx.commit().await?;
        Ok(address)
    }

    /// Replace the fields of an existing address.
    ///
    /// Setting `is_default` makes it the default; clearing it on the current
    /// default is ignored, since a customer always keeps one default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the customer.
    pub async fn update(
        &self,
        customer_id: CustomerId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_owned(&mut tx, customer_id, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let make_default = input.is_default && !existing.is_default;
        if make_default {
            clear_default(&mut tx, customer_id).await?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE shop.address SET \
                full_name = $3, street = $4, city = $5, state = $6, zip_code = $7, \
                country = $8, phone_number = $9, address_type = $10, \
                is_default = is_default OR $11, updated_at = NOW() \
             WHERE customer_id = $1 AND id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(customer_id.as_i32())
        .bind(id.as_i32())
        .bind(&input.full_name)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.zip_code)
        .bind(&input.country)
        .bind(&input.phone_number)
        .bind(input.address_type)
        .bind(make_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete an address, promoting another one if it was the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the customer.
    pub async fn delete(&self, customer_id: CustomerId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let was_default: Option<bool> = sqlx::query_scalar(
            "DELETE FROM shop.address WHERE customer_id = $1 AND id = $2 RETURNING is_default",
        )
        .bind(customer_id.as_i32())
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;

        match was_default {
            None => return Err(RepositoryError::NotFound),
            Some(true) => {
                sqlx::query(
                    r"
                    UPDATE shop.address SET is_default = TRUE
                    WHERE id = (
                        SELECT id FROM shop.address
                        WHERE customer_id = $1
                        ORDER BY updated_at DESC, id DESC
                        LIMIT 1
                    )
                    ",
                )
                .bind(customer_id.as_i32())
                .execute(&mut *tx)
                .await?;
            }
            Some(false) => {}
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make an address the customer's default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the customer.
    pub async fn set_default(
        &self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if fetch_owned(&mut tx, customer_id, id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }
        clear_default(&mut tx, customer_id).await?;

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE shop.address SET is_default = TRUE, updated_at = NOW() \
             WHERE customer_id = $1 AND id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(customer_id.as_i32())
        .bind(id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

/// Fetch an address if it belongs to the customer.
pub(crate) async fn fetch_owned(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    id: AddressId,
) -> Result<Option<Address>, RepositoryError> {
    let row = sqlx::query_as::<_, AddressRow>(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE customer_id = $1 AND id = $2"
    ))
    .bind(customer_id.as_i32())
    .bind(id.as_i32())
    .fetch_optional(conn)
    .await?;

    Ok(row.map(Address::from))
}

/// Insert an address on an open connection or transaction.
///
/// The address becomes the default when requested or when it is the
/// customer's first.
pub(crate) async fn insert(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    input: &AddressInput,
) -> Result<Address, RepositoryError> {
    let has_any: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.address WHERE customer_id = $1)")
            .bind(customer_id.as_i32())
            .fetch_one(&mut *conn)
            .await?;

    let is_default = input.is_default || !has_any;
    if is_default && has_any {
        clear_default(conn, customer_id).await?;
    }

    let row = sqlx::query_as::<_, AddressRow>(&format!(
        "INSERT INTO shop.address \
            (customer_id, full_name, street, city, state, zip_code, country, \
             phone_number, address_type, is_default) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {ADDRESS_COLUMNS}"
    ))
    .bind(customer_id.as_i32())
    .bind(&input.full_name)
    .bind(&input.street)
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.zip_code)
    .bind(&input.country)
    .bind(&input.phone_number)
    .bind(input.address_type)
    .bind(is_default)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}

async fn clear_default(conn: &mut PgConnection, customer_id: CustomerId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE shop.address SET is_default = FALSE WHERE customer_id = $1 AND is_default")
        .bind(customer_id.as_i32())
        .execute(conn)
        .await?;
    Ok(())
}
