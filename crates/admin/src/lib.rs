//! Kirana admin console library.
//!
//! JSON API for store staff: catalog and hero banners, order fulfilment,
//! customer lookup, store and payment settings, and admin users.
//!
//! # Security
//!
//! This crate holds HIGH PRIVILEGE access: it writes the Razorpay secret and
//! manages admin accounts. Serve it on a private network only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
