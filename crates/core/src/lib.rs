//! Kirana Core - Shared domain types and rules.
//!
//! This crate provides the types and pricing rules used by every Kirana component:
//! - `storefront` - Public-facing shopping API
//! - `admin` - Internal store management API
//! - `cli` - Command-line tools for migrations, seeding and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything the storefront and admin must agree on
//! (how a cart is priced, which order status moves are legal, what a complete
//! address looks like) lives here so both binaries compute the same answer.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, and statuses
//! - [`address`] - Shipping address input and validation
//! - [`cart`] - Cart line pricing, shipping and partial payment split
//! - [`checkout`] - Checkout steps and the order placement request
//! - [`pagination`] - Keyset pagination for listings
//! - [`validation`] - Field-level request validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod checkout;
pub mod pagination;
pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{FieldError, ValidationErrors};
