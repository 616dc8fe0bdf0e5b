//! Catalog records and the request bodies that create or change them.
//!
//! The input types carry their own validation so the HTTP handlers and the
//! YAML seeder reject the same mistakes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kirana_core::{CategoryId, HeroBannerId, ProductId, ProductSource, ValidationErrors};

const MAX_NAME_LENGTH: usize = 200;
const MAX_SLUG_LENGTH: usize = 80;
const MAX_IMAGES: usize = 12;

/// A product category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    /// Products in this category may be paid partly upfront.
    pub partial_payment: bool,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Body for creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    /// Derived from the name when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub partial_payment: bool,
}

impl CategoryInput {
    /// The slug to store: the given one, or one derived from the name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| slugify(&self.name), str::to_owned)
    }

    /// Check field presence and shape.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name);
        if self.name.chars().count() > MAX_NAME_LENGTH {
            errors.add("name", format!("must be at most {MAX_NAME_LENGTH} characters"));
        }
        let slug = self.slug();
        if !is_valid_slug(&slug) {
            errors.add("slug", "must be lowercase letters, digits and hyphens");
        }
        errors.into_result()
    }
}

/// A product as the admin console sees it, including inactive ones.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub source: ProductSource,
    /// Supplier catalog identifier, set only for supplier products.
    pub supplier_pid: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    /// `None` when stock is not tracked.
    pub stock: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub source: ProductSource,
    #[serde(default)]
    pub supplier_pid: Option<String>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl ProductInput {
    /// Supplier id with blanks treated as absent.
    #[must_use]
    pub fn supplier_pid(&self) -> Option<&str> {
        self.supplier_pid
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Check field presence, prices and the source/supplier pairing.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors.require("name", &self.name);
        if self.name.chars().count() > MAX_NAME_LENGTH {
            errors.add("name", format!("must be at most {MAX_NAME_LENGTH} characters"));
        }

        if self.price.is_sign_negative() {
            errors.add("price", "cannot be negative");
        }
        if let Some(discount) = self.discount_price {
            if discount.is_sign_negative() {
                errors.add("discountPrice", "cannot be negative");
            } else if discount >= self.price {
                errors.add("discountPrice", "must be lower than the price");
            }
        }

        if self.stock.is_some_and(|s| s < 0) {
            errors.add("stock", "cannot be negative");
        }

        if self.images.len() > MAX_IMAGES {
            errors.add("images", format!("at most {MAX_IMAGES} images"));
        }
        if self.images.iter().any(|url| !is_image_url(url)) {
            errors.add("images", "must be http(s) URLs or absolute paths");
        }

        match (self.source, self.supplier_pid()) {
            (ProductSource::Supplier, None) => {
                errors.add("supplierPid", "required for supplier products");
            }
            (ProductSource::Store, Some(_)) => {
                errors.add("supplierPid", "only supplier products have a supplier id");
            }
            _ => {}
        }

        errors.into_result()
    }
}

/// A home page carousel slide.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBanner {
    pub id: HeroBannerId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub cta: String,
    pub link: String,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for creating or replacing a hero banner.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBannerInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub cta: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl HeroBannerInput {
    /// Check field presence and URL shape.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title);
        errors.require("image", &self.image);
        if !self.image.trim().is_empty() && !is_image_url(&self.image) {
            errors.add("image", "must be an http(s) URL or absolute path");
        }
        if !self.cta.trim().is_empty() && self.link.trim().is_empty() {
            errors.add("link", "required when a call to action is set");
        }
        errors.into_result()
    }
}

/// Lowercase the name and join its words with hyphens.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn is_image_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> ProductInput {
        serde_json::from_value(serde_json::json!({
            "name": "Basmati Rice 5kg",
            "price": "650.00",
            "discountPrice": "599.00",
            "images": ["https://cdn.example.in/rice.jpg"],
            "stock": 40
        }))
        .unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Dals & Pulses "), "dals-pulses");
        assert_eq!(slugify("Ghee/Oil 2024"), "ghee-oil-2024");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_category_slug_defaults_to_name() {
        let input = CategoryInput {
            name: "Spices & Masala".to_string(),
            slug: None,
            partial_payment: false,
        };
        assert_eq!(input.slug(), "spices-masala");
        assert!(input.validate().is_ok());

        let bad = CategoryInput {
            name: "Spices".to_string(),
            slug: Some("Spices Masala".to_string()),
            partial_payment: true,
        };
        assert!(bad.validate().unwrap_err().has("slug"));
    }

    #[test]
    fn test_product_defaults() {
        let input = product();
        assert!(input.is_active);
        assert_eq!(input.source, ProductSource::Store);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_discount_must_be_lower_than_price() {
        let mut input = product();
        input.discount_price = Some("650.00".parse().unwrap());
        assert!(input.validate().unwrap_err().has("discountPrice"));
    }

    #[test]
    fn test_supplier_products_need_a_supplier_id() {
        let mut input = product();
        input.source = ProductSource::Supplier;
        input.supplier_pid = Some("   ".to_string());
        assert!(input.validate().unwrap_err().has("supplierPid"));

        input.supplier_pid = Some("CJ-1182".to_string());
        assert!(input.validate().is_ok());

        input.source = ProductSource::Store;
        assert!(input.validate().unwrap_err().has("supplierPid"));
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut input = product();
        input.price = "-1".parse().unwrap();
        input.stock = Some(-5);
        input.discount_price = None;
        let errors = input.validate().unwrap_err();
        assert!(errors.has("price"));
        assert!(errors.has("stock"));
    }

    #[test]
    fn test_banner_validation() {
        let banner = HeroBannerInput {
            title: "Diwali Sale".to_string(),
            description: String::new(),
            image: "ftp://x".to_string(),
            cta: "Shop now".to_string(),
            link: String::new(),
            is_active: true,
        };
        let errors = banner.validate().unwrap_err();
        assert!(errors.has("image"));
        assert!(errors.has("link"));
    }
}
