//! Hero banners for the home page carousel.

use sqlx::PgPool;

use kirana_core::HeroBannerId;

use super::RepositoryError;
use crate::models::HeroBanner;

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: i32,
    title: String,
    description: String,
    image: String,
    cta: String,
    link: String,
    display_order: i32,
}

impl From<BannerRow> for HeroBanner {
    fn from(row: BannerRow) -> Self {
        Self {
            id: HeroBannerId::new(row.id),
            title: row.title,
            description: row.description,
            image: row.image,
            cta: row.cta,
            link: row.link,
            order: row.display_order,
        }
    }
}

/// Read access to hero banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active banners in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<HeroBanner>, RepositoryError> {
        let rows = sqlx::query_as::<_, BannerRow>(
            r"
            SELECT id, title, description, image, cta, link, display_order
            FROM shop.hero_banner
            WHERE is_active
            ORDER BY display_order, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(HeroBanner::from).collect())
    }
}
