//! Domain models for the admin console.

pub mod admin_user;
pub mod catalog;
pub mod customer;
pub mod dashboard;
pub mod order;
pub mod settings;

pub use admin_user::{AdminRole, AdminUser, CurrentAdmin};
pub use catalog::{Category, CategoryInput, HeroBanner, HeroBannerInput, Product, ProductInput};
pub use customer::{CustomerAddress, CustomerDetail, CustomerSummary};
pub use dashboard::{DashboardStats, LowStockProduct, StatusCount};
pub use order::{OrderDetail, OrderEvent, OrderItem, OrderSummary, StatusChange};
pub use settings::{RazorpaySettings, RazorpaySettingsInput, RazorpaySettingsView, StoreSettings};
