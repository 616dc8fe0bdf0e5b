//! Admin user management commands.
//!
//! Used to create the first super admin; later admins can be created from
//! the console.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `KR_ADMIN_PASSWORD` - initial password of the admin being created. Kept
//!   out of argv so it never shows up in `ps` or shell history.

use kirana_admin::db;
use kirana_admin::services::{AdminAuthError, AdminAuthService};
use kirana_core::AdminRole;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::{MissingEnvVar, database_url};

/// Environment variable holding the new admin's initial password.
pub const PASSWORD_ENV: &str = "KR_ADMIN_PASSWORD";

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Set {PASSWORD_ENV} to the new admin's initial password")]
    MissingPassword,

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Rejected by the auth service (bad email, weak password, duplicate).
    #[error("{0}")]
    Auth(#[from] AdminAuthError),
}

/// Create a new admin user and return its ID.
///
/// The password is read from `KR_ADMIN_PASSWORD`.
///
/// # Errors
///
/// Returns `AdminError` if the input is invalid or the email is taken.
pub async fn create_user(email: &str, name: &str, role: &str) -> Result<i32, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let url = database_url("ADMIN_DATABASE_URL")?;
    let password = initial_password(std::env::var(PASSWORD_ENV).ok())?;

    tracing::info!("Connecting to admin database...");
    let pool = db::create_pool(&url).await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let user = AdminAuthService::new(&pool)
        .create_admin(email, name, role, password.expose_secret())
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id.as_i32())
}

fn initial_password(value: Option<String>) -> Result<SecretString, AdminError> {
    value
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
        .ok_or(AdminError::MissingPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_must_be_set() {
        assert!(matches!(initial_password(None), Err(AdminError::MissingPassword)));
        assert!(matches!(
            initial_password(Some(String::new())),
            Err(AdminError::MissingPassword)
        ));
    }

    #[test]
    fn test_password_is_taken_verbatim() {
        let password = initial_password(Some(" correct horse battery ".to_owned()));
        assert!(matches!(password, Ok(ref p) if p.expose_secret() == " correct horse battery "));
    }
}
