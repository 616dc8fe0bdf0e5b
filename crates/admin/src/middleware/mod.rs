//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (admin frontend origin only)
//! 5. Security headers
//!
//! Authentication and role checks are per handler through the extractors in
//! [`auth`].

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{BearerToken, RequireAdmin, RequireSuperAdmin, RequireWriter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
