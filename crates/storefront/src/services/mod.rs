//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration, login and bearer tokens
//! - `cart` - Cart quantity and stock rules, priced cart views
//! - `checkout` - Checkout summary and order placement
//! - `razorpay` - Payment gateway client and signature verification

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod razorpay;
