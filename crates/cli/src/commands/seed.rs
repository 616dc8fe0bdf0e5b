//! Seed the catalog from a YAML file.
//!
//! The whole file is parsed and validated before connecting, then applied in
//! one transaction. Seeding is repeatable:
//!
//! - categories are matched by slug
//! - supplier products by supplier id, store products by name
//! - hero banners by title
//!
//! ```yaml
//! categories:
//!   - name: Spices
//!     partialPayment: false
//! products:
//!   - name: Turmeric 200g
//!     category: spices
//!     price: "89.00"
//!     stock: 40
//! heroBanners:
//!   - title: Diwali sale
//!     image: /images/diwali.jpg
//!     cta: Shop now
//!     link: /products?category=sweets
//! ```

use std::path::Path;

use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info};

use kirana_admin::models::{CategoryInput, HeroBannerInput, ProductInput};
use kirana_core::ProductSource;

use super::database_url;

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub hero_banners: Vec<HeroBannerInput>,
}

/// A product with its category given by slug.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    pub product: ProductInput,
}

/// Rows written by a seed run.
#[derive(Debug, Default)]
struct SeedSummary {
    categories: usize,
    products: usize,
    hero_banners: usize,
}

/// Collect every validation problem in a seed, labelled by entry.
fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut problems = Vec::new();

    for (i, category) in seed.categories.iter().enumerate() {
        if let Err(errors) = category.validate() {
            problems.push(format!("categories[{i}] ({}): {errors}", category.name));
        }
    }
    for (i, entry) in seed.products.iter().enumerate() {
        if let Err(errors) = entry.product.validate() {
            problems.push(format!("products[{i}] ({}): {errors}", entry.product.name));
        }
    }
    for (i, banner) in seed.hero_banners.iter().enumerate() {
        if let Err(errors) = banner.validate() {
            problems.push(format!("heroBanners[{i}] ({}): {errors}", banner.title));
        }
    }

    problems
}

/// Upsert categories, products and hero banners from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, a product names an
/// unknown category, or a database operation fails. Nothing is written
/// unless every entry succeeds.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let problems = validate(&seed);
    if !problems.is_empty() {
        error!("Seed validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(format!("{} validation errors found", problems.len()).into());
    }
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        hero_banners = seed.hero_banners.len(),
        "Seed validated"
    );

    let url = database_url("ADMIN_DATABASE_URL")?;
    let pool = PgPool::connect(url.expose_secret()).await?;

    let mut tx = pool.begin().await?;
    let summary = apply(&mut tx, &seed).await?;
    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Products: {}", summary.products);
    info!("  Hero banners: {}", summary.hero_banners);
    Ok(())
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    seed: &CatalogSeed,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let mut summary = SeedSummary::default();

    for category in &seed.categories {
        sqlx::query(
            r"
            INSERT INTO shop.category (name, slug, partial_payment)
            VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, partial_payment = EXCLUDED.partial_payment
            ",
        )
        .bind(category.name.trim())
        .bind(category.slug())
        .bind(category.partial_payment)
        .execute(&mut **tx)
        .await?;
        summary.categories += 1;
    }

    for entry in &seed.products {
        let category_id: Option<i32> = match entry.category.as_deref() {
            Some(slug) => Some(
                sqlx::query_scalar("SELECT id FROM shop.category WHERE slug = $1")
                    .bind(slug)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or_else(|| {
                        format!("product {:?}: unknown category {slug:?}", entry.product.name)
                    })?,
            ),
            None => None,
        };
        upsert_product(tx, &entry.product, category_id).await?;
        summary.products += 1;
    }

    for banner in &seed.hero_banners {
        upsert_banner(tx, banner).await?;
        summary.hero_banners += 1;
    }

    Ok(summary)
}

async fn upsert_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &ProductInput,
    category_id: Option<i32>,
) -> Result<(), sqlx::Error> {
    let existing: Option<i32> = match (product.source, product.supplier_pid()) {
        (ProductSource::Supplier, Some(pid)) => {
            sqlx::query_scalar("SELECT id FROM shop.product WHERE supplier_pid = $1")
                .bind(pid)
                .fetch_optional(&mut **tx)
                .await?
        }
        _ => {
            sqlx::query_scalar(
                "SELECT id FROM shop.product WHERE source = 'store' AND name = $1 ORDER BY id LIMIT 1",
            )
            .bind(product.name.trim())
            .fetch_optional(&mut **tx)
            .await?
        }
    };

    let sql = if existing.is_some() {
        r"
        UPDATE shop.product
        SET source = $2, supplier_pid = $3, name = $4, description = $5, price = $6,
            discount_price = $7, images = $8, category_id = $9, stock = $10,
            is_active = $11, updated_at = NOW()
        WHERE id = $1
        "
    } else {
        r"
        INSERT INTO shop.product
            (source, supplier_pid, name, description, price, discount_price,
             images, category_id, stock, is_active)
        SELECT $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
        WHERE $1::INTEGER IS NULL
        "
    };

    sqlx::query(sql)
        .bind(existing)
        .bind(product.source)
        .bind(product.supplier_pid())
        .bind(product.name.trim())
        .bind(product.description.trim())
        .bind(product.price)
        .bind(product.discount_price)
        .bind(&product.images)
        .bind(category_id)
        .bind(product.stock)
        .bind(product.is_active)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn upsert_banner(
    tx: &mut Transaction<'_, Postgres>,
    banner: &HeroBannerInput,
) -> Result<(), sqlx::Error> {
    let updated = sqlx::query(
        r"
        UPDATE shop.hero_banner
        SET description = $2, image = $3, cta = $4, link = $5, is_active = $6, updated_at = NOW()
        WHERE title = $1
        ",
    )
    .bind(banner.title.trim())
    .bind(banner.description.trim())
    .bind(banner.image.trim())
    .bind(banner.cta.trim())
    .bind(banner.link.trim())
    .bind(banner.is_active)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    if updated == 0 {
        sqlx::query(
            r"
            INSERT INTO shop.hero_banner (title, description, image, cta, link, is_active, display_order)
            VALUES ($1, $2, $3, $4, $5, $6,
                    (SELECT COALESCE(MAX(display_order) + 1, 0) FROM shop.hero_banner))
            ",
        )
        .bind(banner.title.trim())
        .bind(banner.description.trim())
        .bind(banner.image.trim())
        .bind(banner.cta.trim())
        .bind(banner.link.trim())
        .bind(banner.is_active)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r#"
categories:
  - name: Spices
    partialPayment: false
  - name: Brass Lamps
    slug: brass-lamps
    partialPayment: true
products:
  - name: Turmeric 200g
    category: spices
    price: "89.00"
    stock: 40
  - name: Temple diya
    category: brass-lamps
    price: "2499"
    discountPrice: "1999"
    source: supplier
    supplierPid: SUP-881
heroBanners:
  - title: Diwali sale
    image: /images/diwali.jpg
    cta: Shop now
    link: /products?category=brass-lamps
"#;

    #[test]
    fn parses_products_with_category_slugs() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.categories.len(), 2);
        assert_eq!(seed.categories[0].slug(), "spices");
        assert_eq!(seed.products[0].category.as_deref(), Some("spices"));
        assert_eq!(seed.products[1].product.source, ProductSource::Supplier);
        assert_eq!(seed.products[1].product.supplier_pid(), Some("SUP-881"));
        assert!(seed.products[0].product.is_active);
        assert_eq!(seed.hero_banners[0].title, "Diwali sale");
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn reports_every_invalid_entry() {
        let yaml = r#"
products:
  - name: Broken
    price: "10"
    discountPrice: "12"
  - name: Orphan supplier item
    price: "5"
    source: supplier
heroBanners:
  - title: ""
    image: ftp://example.in/a.jpg
"#;
        let seed: CatalogSeed = serde_yaml::from_str(yaml).unwrap();
        let problems = validate(&seed);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].starts_with("products[0] (Broken)"));
        assert!(problems[1].contains("supplierPid"));
        assert!(problems[2].starts_with("heroBanners[0]"));
    }

    #[test]
    fn empty_file_sections_default() {
        let seed: CatalogSeed = serde_yaml::from_str("categories: []").unwrap();
        assert!(seed.products.is_empty());
        assert!(seed.hero_banners.is_empty());
    }
}
