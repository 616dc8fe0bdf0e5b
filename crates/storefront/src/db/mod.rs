//! Database operations for the storefront.
//!
//! # Schema: `shop`
//!
//! The storefront reads the catalog and settings the admin console maintains,
//! and owns the rows customers create:
//!
//! ## Tables
//!
//! - `customer`, `customer_token` - Accounts and bearer tokens
//! - `address` - Saved shipping addresses (one default per customer)
//! - `category`, `product` - Catalog (read-only here)
//! - `hero_banner` - Home page carousel (read-only here)
//! - `cart_item` - Persistent carts
//! - `customer_order`, `order_item`, `order_event` - Orders and their timeline
//! - `store_settings`, `razorpay_settings` - Singleton configuration rows
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p kirana-cli -- migrate storefront
//! ```

pub mod addresses;
pub mod banners;
pub mod carts;
pub mod catalog;
pub mod customers;
pub mod orders;
pub mod settings;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use banners::BannerRepository;
pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use settings::SettingsRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
