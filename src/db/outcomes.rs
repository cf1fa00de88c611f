//! Audit trail of publish attempts.

use crate::types::{Excerpt, PublishFailure, PublishSuccess};
use crate::{Error, Result};

use super::{Database, FailedPostRow, SuccessfulPostRow};

impl Database {
    /// Record an accepted post
    ///
    /// The posted text must refer to a stored excerpt.
    pub async fn insert_successful_post(&self, outcome: &PublishSuccess) -> Result<i64> {
        let edit_history_ids = serde_json::to_string(&outcome.edit_history_ids)?;

        let result = sqlx::query(
            r#"
            INSERT INTO successful_posts (posted_at, posted_excerpt, post_id, edit_history_ids)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(outcome.posted_at.timestamp())
        .bind(&outcome.text)
        .bind(&outcome.post_id)
        .bind(edit_history_ids)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        tracing::info!(post_id = %outcome.post_id, "Recorded successful post");
        Ok(result.last_insert_rowid())
    }

    /// Record a structured rejection of `excerpt`
    pub async fn insert_failed_post(
        &self,
        excerpt: &Excerpt,
        outcome: &PublishFailure,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO failed_posts (failed_at, title, type, detail, status, failed_excerpt)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(outcome.failed_at.timestamp())
        .bind(&outcome.title)
        .bind(&outcome.kind)
        .bind(&outcome.detail)
        .bind(outcome.status)
        .bind(&excerpt.text)
        .execute(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        tracing::info!(status = outcome.status, "Recorded failed post");
        Ok(result.last_insert_rowid())
    }

    /// Most recent successful posts, newest first
    pub async fn list_successful_posts(&self, limit: usize) -> Result<Vec<PublishSuccess>> {
        let rows = sqlx::query_as::<_, SuccessfulPostRow>(
            r#"
            SELECT id, posted_at, posted_excerpt, post_id, edit_history_ids
            FROM successful_posts
            ORDER BY posted_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        rows.into_iter().map(PublishSuccess::try_from).collect()
    }

    /// Most recent failed posts with the excerpt text, newest first
    pub async fn list_failed_posts(&self, limit: usize) -> Result<Vec<(String, PublishFailure)>> {
        let rows = sqlx::query_as::<_, FailedPostRow>(
            r#"
            SELECT id, failed_at, title, type, detail, status, failed_excerpt
            FROM failed_posts
            ORDER BY failed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.failed_excerpt.clone(), PublishFailure::from(row)))
            .collect())
    }
}
