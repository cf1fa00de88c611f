//! Storage contract used by the import pipeline and the publish scheduler
//!
//! [`Database`](crate::db::Database) is the production implementation. Tests
//! substitute in-memory fakes.

use crate::Result;
use crate::types::{Excerpt, PublishFailure, PublishSuccess};
use async_trait::async_trait;

/// Persistence for excerpts and publish outcomes
///
/// Implementations must be safe to share between tasks; the core never
/// locks around them.
#[async_trait]
pub trait ExcerptStore: Send + Sync {
    /// Create tables if they do not exist yet
    async fn create_schema_if_absent(&self) -> Result<()>;

    /// Store a batch atomically and return what was stored
    ///
    /// An excerpt whose text is already stored is a constraint violation,
    /// reported as an error rather than skipped.
    async fn batch_insert_excerpts(&self, batch: Vec<Excerpt>) -> Result<Vec<Excerpt>>;

    /// Pick one stored excerpt uniformly at random
    async fn get_random_excerpt(&self) -> Result<Excerpt>;

    /// Record an accepted post
    async fn record_success(&self, outcome: &PublishSuccess) -> Result<()>;

    /// Record a structured rejection for `excerpt`
    async fn record_failure(&self, excerpt: &Excerpt, outcome: &PublishFailure) -> Result<()>;
}
