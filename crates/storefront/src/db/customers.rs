//! Customer accounts and bearer tokens.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kirana_core::{CustomerId, Email};

use super::RepositoryError;
use crate::models::{CurrentCustomer, Customer};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    full_name: String,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            email,
            full_name: row.full_name,
            phone_number: row.phone_number,
            created_at: row.created_at,
        })
    }
}

/// Row for password verification during login.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: i32,
    email: String,
    full_name: String,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    password_hash: String,
}

/// Repository for customer accounts.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a customer account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(
        &self,
        email: &Email,
        full_name: &str,
        phone_number: Option<&str>,
        password_hash: &str,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO shop.customer (email, full_name, phone_number, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, full_name, phone_number, created_at
            ",
        )
        .bind(email.as_str())
        .bind(full_name)
        .bind(phone_number)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email already registered"))?;

        row.try_into()
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, email, full_name, phone_number, created_at
            FROM shop.customer
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a customer and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, email, full_name, phone_number, created_at, password_hash
            FROM shop.customer
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            let customer = CustomerRow {
                id: row.id,
                email: row.email,
                full_name: row.full_name,
                phone_number: row.phone_number,
                created_at: row.created_at,
            }
            .try_into()?;
            Ok((customer, row.password_hash))
        })
        .transpose()
    }

    /// Store a token hash for a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_token(
        &self,
        customer_id: CustomerId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.customer_token (customer_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(customer_id.as_i32())
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Resolve an unexpired token hash to its customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<CurrentCustomer>, RepositoryError> {
        let row: Option<(i32, String)> = sqlx::query_as(
            r"
            SELECT c.id, c.email
            FROM shop.customer_token t
            JOIN shop.customer c ON c.id = t.customer_id
            WHERE t.token_hash = $1 AND t.expires_at > NOW()
            ",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(id, email)| {
            let email = Email::parse(&email).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
            Ok(CurrentCustomer {
                id: CustomerId::new(id),
                email,
            })
        })
        .transpose()
    }

    /// Delete a token. Deleting an unknown token is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_token(&self, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.customer_token WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Remove expired tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn purge_expired_tokens(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.customer_token WHERE expires_at <= NOW()")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
