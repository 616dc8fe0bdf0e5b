//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read a database URL, falling back to `DATABASE_URL`.
pub(crate) fn database_url(primary_key: &'static str) -> Result<SecretString, MissingEnvVar> {
    dotenvy::dotenv().ok();
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingEnvVar(primary_key))
}

/// A required environment variable is not set.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0} (or DATABASE_URL)")]
pub struct MissingEnvVar(pub &'static str);
