//! Database migration commands.
//!
//! Both migration sets live in one database and share sqlx's bookkeeping
//! table, so each run ignores migrations applied by the other set.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - used for `migrate storefront`
//! - `ADMIN_DATABASE_URL` - used for `migrate admin`
//! - `DATABASE_URL` - fallback for both
//!
//! # Migration Files
//!
//! Storefront migrations (`shop` schema): `crates/storefront/migrations/`
//! Admin migrations (`admin` schema): `crates/admin/migrations/`

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;

use super::{MissingEnvVar, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    run(
        "storefront",
        "STOREFRONT_DATABASE_URL",
        sqlx::migrate!("../storefront/migrations"),
    )
    .await
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    run(
        "admin",
        "ADMIN_DATABASE_URL",
        sqlx::migrate!("../admin/migrations"),
    )
    .await
}

async fn run(
    name: &str,
    env_key: &'static str,
    mut migrator: Migrator,
) -> Result<(), MigrationError> {
    let url = database_url(env_key)?;

    tracing::info!("Connecting to {name} database...");
    let pool = PgPool::connect(url.expose_secret()).await?;

    tracing::info!("Running {name} migrations...");
    migrator.set_ignore_missing(true).run(&pool).await?;

    tracing::info!("{name} migrations complete");
    Ok(())
}
