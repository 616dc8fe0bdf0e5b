//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login and bearer tokens for console users

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService, IssuedToken};
