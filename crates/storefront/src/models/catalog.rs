//! Catalog domain types: categories, products and hero banners.

use rust_decimal::Decimal;
use serde::Serialize;

use kirana_core::cart::effective_unit_price;
use kirana_core::{CategoryId, HeroBannerId, ProductId, ProductSource};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    /// Products in this category can be paid partly upfront.
    pub partial_payment: bool,
}

/// Category summary embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub partial_payment: bool,
}

/// A product as shown to shoppers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub source: ProductSource,
    /// Supplier catalog identifier (supplier products only).
    pub pid: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub images: Vec<String>,
    pub category: Option<CategoryRef>,
    /// Tracked stock; `None` when the supplier manages inventory.
    pub stock: Option<i32>,
}

impl Product {
    /// Price the shopper pays per unit.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        effective_unit_price(self.price, self.discount_price)
    }

    /// Whether at least one unit can be ordered.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }

    /// First image, used as the cart and order thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        self.images.first().cloned()
    }

    /// Whether partial upfront payment applies to this product.
    #[must_use]
    pub fn allows_partial_payment(&self) -> bool {
        self.category.as_ref().is_some_and(|c| c.partial_payment)
    }
}

/// A home page carousel slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBanner {
    pub id: HeroBannerId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub cta: String,
    pub link: String,
    pub order: i32,
}
