//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. All of them serialize as camelCase JSON for the web
//! frontend.

pub mod address;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod settings;

pub use address::Address;
pub use catalog::{Category, CategoryRef, HeroBanner, Product};
pub use customer::{CurrentCustomer, Customer};
pub use order::{Order, OrderEvent, OrderItem};
pub use settings::{RazorpayCredentials, StoreSettings};
