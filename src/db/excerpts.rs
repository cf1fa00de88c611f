//! Excerpt storage and random selection.

use crate::error::DatabaseError;
use crate::types::Excerpt;
use crate::{Error, Result};

use super::{Database, ExcerptRow};

impl Database {
    /// Insert excerpts in a single transaction
    ///
    /// Either every excerpt in `excerpts` is stored or none is. A text that
    /// is already present fails the whole batch with
    /// [`DatabaseError::ConstraintViolation`].
    pub async fn insert_excerpts(&self, excerpts: &[Excerpt]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let mut inserted = 0;
        for excerpt in excerpts {
            let result = sqlx::query(
                r#"
                INSERT INTO excerpts (excerpt, series, part, chapter)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&excerpt.text)
            .bind(excerpt.series.to_i32())
            .bind(&excerpt.part)
            .bind(&excerpt.chapter)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    Error::Database(DatabaseError::ConstraintViolation(format!(
                        "excerpt already stored: {:?}",
                        excerpt.text
                    )))
                }
                other => Error::Sqlx(other),
            })?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit excerpt batch: {}",
                e
            )))
        })?;

        Ok(inserted)
    }

    /// Pick a random excerpt
    ///
    /// Returns [`DatabaseError::NotFound`] when nothing has been imported.
    pub async fn random_excerpt(&self) -> Result<Excerpt> {
        let row = sqlx::query_as::<_, ExcerptRow>(
            r#"
            SELECT series, part, chapter, excerpt
            FROM excerpts
            ORDER BY random()
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        let excerpt: Excerpt = row
            .map(Excerpt::from)
            .ok_or_else(|| DatabaseError::NotFound("no excerpts stored".to_string()))?;

        tracing::debug!(
            chapter = %excerpt.chapter,
            part = %excerpt.part,
            "Fetched random excerpt"
        );
        Ok(excerpt)
    }

    /// Look up an excerpt by its text
    pub async fn get_excerpt(&self, text: &str) -> Result<Option<Excerpt>> {
        let row = sqlx::query_as::<_, ExcerptRow>(
            "SELECT series, part, chapter, excerpt FROM excerpts WHERE excerpt = ?",
        )
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(row.map(Excerpt::from))
    }

    /// Count stored excerpts
    pub async fn count_excerpts(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM excerpts")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }
}
