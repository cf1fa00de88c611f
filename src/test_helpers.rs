//! In-memory collaborators for pipeline and scheduler tests.

use crate::error::DatabaseError;
use crate::storage::ExcerptStore;
use crate::transport::PostTransport;
use crate::types::{Excerpt, PublishAttempt, PublishFailure, PublishSuccess, Series};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn excerpt(text: &str) -> Excerpt {
    Excerpt::new(Series::Original, "Part I", "Chapter 1", text)
}

/// Store that keeps everything in vectors and serves scripted random picks
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub batches: Mutex<Vec<Vec<Excerpt>>>,
    pub picks: Mutex<VecDeque<Excerpt>>,
    pub successes: Mutex<Vec<PublishSuccess>>,
    pub failures: Mutex<Vec<(Excerpt, PublishFailure)>>,
    pub random_calls: AtomicUsize,
    /// One-based batch number that fails
    pub fail_batch: Option<usize>,
    pub fail_records: bool,
}

impl MemoryStore {
    pub fn with_picks(texts: &[&str]) -> Self {
        Self {
            picks: Mutex::new(texts.iter().map(|t| excerpt(t)).collect()),
            ..Default::default()
        }
    }

    pub fn push_pick(&self, excerpt: Excerpt) {
        self.picks.lock().unwrap().push_back(excerpt);
    }

    pub fn committed(&self) -> Vec<Vec<Excerpt>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExcerptStore for MemoryStore {
    async fn create_schema_if_absent(&self) -> Result<()> {
        Ok(())
    }

    async fn batch_insert_excerpts(&self, batch: Vec<Excerpt>) -> Result<Vec<Excerpt>> {
        let mut batches = self.batches.lock().unwrap();
        if self.fail_batch == Some(batches.len() + 1) {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "disk I/O error".to_string(),
            )));
        }
        batches.push(batch.clone());
        Ok(batch)
    }

    async fn get_random_excerpt(&self) -> Result<Excerpt> {
        self.random_calls.fetch_add(1, Ordering::SeqCst);
        self.picks
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound("no excerpts stored".into())))
    }

    async fn record_success(&self, outcome: &PublishSuccess) -> Result<()> {
        if self.fail_records {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "database is locked".to_string(),
            )));
        }
        self.successes.lock().unwrap().push(outcome.clone());
        Ok(())
    }

    async fn record_failure(&self, excerpt: &Excerpt, outcome: &PublishFailure) -> Result<()> {
        if self.fail_records {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "database is locked".to_string(),
            )));
        }
        self.failures
            .lock()
            .unwrap()
            .push((excerpt.clone(), outcome.clone()));
        Ok(())
    }
}

/// What a [`ScriptedTransport`] answers with
pub(crate) enum Reply {
    Accept,
    Reject(i32),
    Fail,
}

/// Transport that answers from a script and remembers what it was asked
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub replies: Mutex<VecDeque<Reply>>,
    pub published: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn replying(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostTransport for ScriptedTransport {
    async fn publish(&self, text: &str) -> PublishAttempt {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let count = {
            let mut published = self.published.lock().unwrap();
            published.push(text.to_string());
            published.len()
        };
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Accept);

        match reply {
            Reply::Accept => PublishAttempt::Published(PublishSuccess {
                posted_at: Utc::now(),
                text: text.to_string(),
                post_id: format!("post-{count}"),
                edit_history_ids: vec![format!("post-{count}")],
            }),
            Reply::Reject(status) => PublishAttempt::Rejected(PublishFailure {
                failed_at: Utc::now(),
                title: "Forbidden".to_string(),
                kind: "about:blank".to_string(),
                detail: "duplicate content".to_string(),
                status,
            }),
            Reply::Fail => PublishAttempt::Failed(Error::Other("connection reset".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
