//! Database layer for excerpt-publisher
//!
//! Handles SQLite persistence for excerpts and the audit trail of publish
//! attempts.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`excerpts`] — Excerpt batch inserts and random selection
//! - [`outcomes`] — Successful and failed post records
//!
//! [`Database`] implements [`ExcerptStore`], which is all the import pipeline
//! and the publish scheduler see of it.

use crate::Result;
use crate::error::DatabaseError;
use crate::storage::ExcerptStore;
use crate::types::{Excerpt, PublishFailure, PublishSuccess, Series};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod excerpts;
mod migrations;
mod outcomes;

/// Excerpt record from database
#[derive(Debug, Clone, FromRow)]
pub struct ExcerptRow {
    /// Series as stored (see [`Series::from_i32`])
    pub series: i32,
    /// Part label
    pub part: String,
    /// Chapter label
    pub chapter: String,
    /// Excerpt text (primary key)
    pub excerpt: String,
}

impl From<ExcerptRow> for Excerpt {
    fn from(row: ExcerptRow) -> Self {
        Excerpt {
            series: Series::from_i32(row.series),
            part: row.part,
            chapter: row.chapter,
            text: row.excerpt,
        }
    }
}

/// Successful post record from database
#[derive(Debug, Clone, FromRow)]
pub struct SuccessfulPostRow {
    /// Unique database ID
    pub id: i64,
    /// Unix timestamp when the post was accepted
    pub posted_at: i64,
    /// Text of the posted excerpt
    pub posted_excerpt: String,
    /// Platform post identifier
    pub post_id: String,
    /// JSON array of revision identifiers
    pub edit_history_ids: String,
}

impl TryFrom<SuccessfulPostRow> for PublishSuccess {
    type Error = crate::Error;

    fn try_from(row: SuccessfulPostRow) -> Result<Self> {
        let edit_history_ids = serde_json::from_str(&row.edit_history_ids).map_err(|e| {
            crate::Error::Database(DatabaseError::QueryFailed(format!(
                "corrupt edit_history_ids for successful post {}: {}",
                row.id, e
            )))
        })?;

        Ok(PublishSuccess {
            posted_at: from_unix(row.posted_at),
            text: row.posted_excerpt,
            post_id: row.post_id,
            edit_history_ids,
        })
    }
}

/// Failed post record from database
#[derive(Debug, Clone, FromRow)]
pub struct FailedPostRow {
    /// Unique database ID
    pub id: i64,
    /// Unix timestamp when the rejection was received
    pub failed_at: i64,
    /// Problem title
    pub title: String,
    /// Problem type
    #[sqlx(rename = "type")]
    pub kind: String,
    /// Problem detail
    pub detail: String,
    /// HTTP status from the problem body
    pub status: i32,
    /// Text of the rejected excerpt
    pub failed_excerpt: String,
}

impl From<FailedPostRow> for PublishFailure {
    fn from(row: FailedPostRow) -> Self {
        PublishFailure {
            failed_at: from_unix(row.failed_at),
            title: row.title,
            kind: row.kind,
            detail: row.detail,
            status: row.status,
        }
    }
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Database handle for excerpt-publisher
pub struct Database {
    pool: SqlitePool,
}

#[async_trait]
impl ExcerptStore for Database {
    async fn create_schema_if_absent(&self) -> Result<()> {
        self.run_migrations().await
    }

    async fn batch_insert_excerpts(&self, batch: Vec<Excerpt>) -> Result<Vec<Excerpt>> {
        self.insert_excerpts(&batch).await?;
        Ok(batch)
    }

    async fn get_random_excerpt(&self) -> Result<Excerpt> {
        self.random_excerpt().await
    }

    async fn record_success(&self, outcome: &PublishSuccess) -> Result<()> {
        self.insert_successful_post(outcome).await.map(|_| ())
    }

    async fn record_failure(&self, excerpt: &Excerpt, outcome: &PublishFailure) -> Result<()> {
        self.insert_failed_post(excerpt, outcome).await.map(|_| ())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
