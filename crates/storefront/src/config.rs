//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ALLOWED_ORIGIN` - Frontend origin allowed by CORS (e.g. `https://shop.example.in`)
//! - `STOREFRONT_TOKEN_TTL_DAYS` - Customer token lifetime in days (default: 30)
//! - `STOREFRONT_LOG_FORMAT` - `json` for JSON logs, anything else for text
//! - `RAZORPAY_API_BASE` - Razorpay REST base URL (default: `https://api.razorpay.com/v1/`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)
//!
//! Razorpay credentials are not configured here: the admin console stores
//! them in `shop.razorpay_settings`, and the storefront reads them per request.

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1/";
const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Frontend origin allowed to call the API cross-origin
    pub allowed_origin: Option<String>,
    /// Lifetime of customer bearer tokens
    pub token_ttl: chrono::Duration,
    /// Emit JSON logs instead of human-readable text
    pub json_logs: bool,
    /// Base URL of the Razorpay REST API (ends with `/`)
    pub razorpay_api_base: Url,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        let allowed_origin = get_optional_env("STOREFRONT_ALLOWED_ORIGIN")
            .map(|origin| parse_origin("STOREFRONT_ALLOWED_ORIGIN", &origin))
            .transpose()?;

        let ttl_days = get_env_or_default("STOREFRONT_TOKEN_TTL_DAYS", "30")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_TOKEN_TTL_DAYS".to_string(), e.to_string())
            })?;
        let token_ttl = parse_token_ttl_days(ttl_days)?;

        let razorpay_api_base = parse_api_base(&get_env_or_default(
            "RAZORPAY_API_BASE",
            DEFAULT_RAZORPAY_API_BASE,
        ))?;

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origin,
            token_ttl,
            json_logs: get_optional_env("STOREFRONT_LOG_FORMAT")
                .is_some_and(|v| v.eq_ignore_ascii_case("json")),
            razorpay_api_base,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_sample_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_sample_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_sample_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(rate)
}

/// Validate a CORS origin: scheme and host only, no path.
fn parse_origin(key: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.host_str().is_none() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http(s) origin".to_string(),
        ));
    }
    Ok(url.origin().ascii_serialization())
}

fn parse_token_ttl_days(days: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_TOKEN_TTL_DAYS".to_string(),
            format!("must be between 1 and {MAX_TOKEN_TTL_DAYS}"),
        ));
    }
    Ok(chrono::Duration::days(days))
}

/// Parse the gateway base URL, making sure relative joins keep the version path.
fn parse_api_base(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidEnvVar("RAZORPAY_API_BASE".to_string(), e.to_string()))
}

/// Configuration for unit tests: local database, default gateway, no Sentry.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/kirana_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        allowed_origin: None,
        token_ttl: chrono::Duration::days(30),
        json_logs: false,
        razorpay_api_base: Url::parse(DEFAULT_RAZORPAY_API_BASE).unwrap(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_parse_origin_strips_path() {
        let origin = parse_origin("X", "https://shop.example.in/app/").unwrap();
        assert_eq!(origin, "https://shop.example.in");
    }

    #[test]
    fn test_parse_origin_rejects_non_http() {
        assert!(parse_origin("X", "ftp://shop.example.in").is_err());
        assert!(parse_origin("X", "not a url").is_err());
    }

    #[test]
    fn test_api_base_gets_trailing_slash() {
        let base = parse_api_base("https://api.razorpay.com/v1").unwrap();
        assert_eq!(base.join("orders").unwrap().as_str(), "https://api.razorpay.com/v1/orders");
    }

    #[test]
    fn test_token_ttl_bounds() {
        assert!(parse_token_ttl_days(0).is_err());
        assert!(parse_token_ttl_days(366).is_err());
        assert_eq!(parse_token_ttl_days(7).unwrap(), chrono::Duration::days(7));
    }
}
