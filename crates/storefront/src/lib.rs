//! Kirana storefront library.
//!
//! The customer-facing JSON API: catalog browsing, persistent carts, saved
//! addresses, checkout with Razorpay or cash on delivery, and order history.
//! Exposed as a library so the router can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
