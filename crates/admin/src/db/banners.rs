//! Hero banner repository.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kirana_core::HeroBannerId;

use super::RepositoryError;
use crate::models::{HeroBanner, HeroBannerInput};

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: i32,
    title: String,
    description: String,
    image: String,
    cta: String,
    link: String,
    is_active: bool,
    display_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
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
            is_active: row.is_active,
            display_order: row.display_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BANNER_COLUMNS: &str =
    "id, title, description, image, cta, link, is_active, display_order, created_at, updated_at";

/// Repository for hero banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    /// Create a new banner repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All banners in display order, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<HeroBanner>, RepositoryError> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.hero_banner ORDER BY display_order, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a banner at the end of the carousel.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &HeroBannerInput) -> Result<HeroBanner, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "INSERT INTO shop.hero_banner (title, description, image, cta, link, is_active, display_order) \
             VALUES ($1, $2, $3, $4, $5, $6, \
                     (SELECT COALESCE(MAX(display_order) + 1, 0) FROM shop.hero_banner)) \
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.image.trim())
        .bind(&input.cta)
        .bind(input.link.trim())
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Replace a banner's content. Its position is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner does not exist.
    pub async fn update(
        &self,
        id: HeroBannerId,
        input: &HeroBannerInput,
    ) -> Result<HeroBanner, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "UPDATE shop.hero_banner SET \
                title = $2, description = $3, image = $4, cta = $5, link = $6, \
                is_active = $7, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.image.trim())
        .bind(&input.cta)
        .bind(input.link.trim())
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Flip a banner between active and hidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner does not exist.
    pub async fn toggle(&self, id: HeroBannerId) -> Result<HeroBanner, RepositoryError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "UPDATE shop.hero_banner SET is_active = NOT is_active, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner does not exist.
    pub async fn delete(&self, id: HeroBannerId) -> Result<(), RepositoryError> {
        let deleted = sqlx::query("DELETE FROM shop.hero_banner WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Reorder the carousel. `ids` must list every banner exactly once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `ids` is not a permutation of
    /// the stored banners; nothing is changed in that case.
    pub async fn reorder(&self, ids: &[HeroBannerId]) -> Result<Vec<HeroBanner>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM shop.hero_banner ORDER BY id FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;

        if !is_permutation(&existing, ids) {
            return Err(RepositoryError::Conflict(
                "ids must list every banner exactly once".to_string(),
            ));
        }

        let ids: Vec<i32> = ids.iter().map(HeroBannerId::as_i32).collect();
        sqlx::query(
            r"
            UPDATE shop.hero_banner b
            SET display_order = o.position - 1, updated_at = NOW()
            FROM UNNEST($1::INTEGER[]) WITH ORDINALITY AS o(id, position)
            WHERE b.id = o.id
            ",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.list_all().await
    }
}

fn is_permutation(existing: &[i32], ids: &[HeroBannerId]) -> bool {
    let requested: HashSet<i32> = ids.iter().map(HeroBannerId::as_i32).collect();
    requested.len() == ids.len()
        && ids.len() == existing.len()
        && existing.iter().all(|id| requested.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i32]) -> Vec<HeroBannerId> {
        raw.iter().copied().map(HeroBannerId::new).collect()
    }

    #[test]
    fn test_reorder_requires_every_banner_once() {
        assert!(is_permutation(&[1, 2, 3], &ids(&[3, 1, 2])));
        assert!(!is_permutation(&[1, 2, 3], &ids(&[3, 1])));
        assert!(!is_permutation(&[1, 2, 3], &ids(&[3, 1, 1])));
        assert!(!is_permutation(&[1, 2, 3], &ids(&[3, 1, 4])));
        assert!(is_permutation(&[], &[]));
    }
}
