//! Periodic publishing of random excerpts
//!
//! [`PublishScheduler`] owns a timer and the anti-repeat queue. On each tick
//! it runs one publish cycle:
//!
//! 1. Draw random excerpts until one is publishable and differs from the
//!    most recent post, giving up after `max_selection_attempts` draws
//! 2. Slide the anti-repeat window: drop its head, enqueue the candidate
//! 3. Publish the text through the transport
//! 4. Record a rejection or a success; opaque transport failures are only logged
//!
//! Cycle errors never stop the loop. Cancellation is observed between
//! cycles, so a cycle in flight always runs to completion.
//!
//! # Example
//!
//! ```no_run
//! use excerpt_publisher::config::{PublisherConfig, TwitterConfig};
//! use excerpt_publisher::db::Database;
//! use excerpt_publisher::publisher::PublishScheduler;
//! use excerpt_publisher::transport::XClient;
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(Database::new(Path::new("excerpts.db")).await?);
//! let transport = Arc::new(XClient::new(&TwitterConfig::default())?);
//! let scheduler = PublishScheduler::new(store, transport, PublisherConfig::default());
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(scheduler.run(cancel.clone()));
//! // ...
//! cancel.cancel();
//! # Ok(())
//! # }
//! ```

use crate::config::PublisherConfig;
use crate::error::{Error, PublishError};
use crate::queue::RecentExcerpts;
use crate::storage::ExcerptStore;
use crate::transport::PostTransport;
use crate::types::{Excerpt, PublishAttempt, PublishFailure, PublishSuccess};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Whether a cycle is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick
    Idle,
    /// Running a publish cycle
    Publishing,
}

/// Result of a cycle that reached the platform and was recorded
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The post was accepted and recorded
    Published(PublishSuccess),
    /// The platform rejected the post; the rejection was recorded
    Rejected {
        /// Excerpt that was submitted
        excerpt: Excerpt,
        /// The platform's explanation
        failure: PublishFailure,
    },
}

/// Timer-driven publisher
pub struct PublishScheduler {
    store: Arc<dyn ExcerptStore>,
    transport: Arc<dyn PostTransport>,
    recent: RecentExcerpts,
    config: PublisherConfig,
    state: SchedulerState,
}

impl PublishScheduler {
    /// Create a scheduler with an empty anti-repeat window
    pub fn new(
        store: Arc<dyn ExcerptStore>,
        transport: Arc<dyn PostTransport>,
        config: PublisherConfig,
    ) -> Self {
        Self {
            store,
            transport,
            recent: RecentExcerpts::new(config.anti_repeat_capacity),
            config,
            state: SchedulerState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Recently published excerpts, oldest first
    pub fn recent(&self) -> &RecentExcerpts {
        &self.recent
    }

    /// Run cycles every `period` until `cancel` fires
    ///
    /// The first cycle runs one period after start. A cycle that overruns the
    /// period delays the next tick instead of queueing extra ones.
    pub async fn run(mut self, cancel: CancellationToken) {
        let period = self.config.period;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            period_secs = period.as_secs(),
            transport = self.transport.name(),
            "Publish scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.publish_cycle().await {
                Ok(CycleOutcome::Published(post)) => {
                    info!(post_id = %post.post_id, "Published excerpt");
                }
                Ok(CycleOutcome::Rejected { excerpt, failure }) => {
                    warn!(
                        status = failure.status,
                        title = %failure.title,
                        detail = %failure.detail,
                        chapter = %excerpt.chapter,
                        "Post rejected by platform"
                    );
                }
                Err(e @ PublishError::Unrecorded { .. }) => {
                    error!(error = %e, "Published but failed to record outcome");
                }
                Err(e) => {
                    error!(error = %e, "Publish cycle failed");
                }
            }
        }

        info!("Publish scheduler stopped");
    }

    /// Run a single publish cycle now
    pub async fn publish_cycle(&mut self) -> Result<CycleOutcome, PublishError> {
        self.state = SchedulerState::Publishing;
        let result = self.run_cycle().await;
        self.state = SchedulerState::Idle;
        result
    }

    async fn run_cycle(&mut self) -> Result<CycleOutcome, PublishError> {
        let candidate = self.select_candidate().await?;

        self.recent.dequeue();
        self.recent.enqueue(candidate.clone());

        let attempt = self
            .bounded("publish", self.transport.publish(&candidate.text))
            .await?;

        match attempt {
            PublishAttempt::Rejected(failure) => {
                self.bounded(
                    "record_failure",
                    self.store.record_failure(&candidate, &failure),
                )
                .await?
                .map_err(PublishError::Storage)?;
                Ok(CycleOutcome::Rejected {
                    excerpt: candidate,
                    failure,
                })
            }
            PublishAttempt::Failed(e) => Err(PublishError::Transport(e)),
            PublishAttempt::Published(mut post) => {
                // The platform may rewrite the text; the record points at the stored excerpt
                post.text = candidate.text;
                let recorded = match self
                    .bounded("record_success", self.store.record_success(&post))
                    .await
                {
                    Ok(result) => result,
                    Err(e) => Err(Error::Other(e.to_string())),
                };
                match recorded {
                    Ok(()) => Ok(CycleOutcome::Published(post)),
                    Err(source) => Err(PublishError::Unrecorded {
                        post_id: post.post_id,
                        source,
                    }),
                }
            }
        }
    }

    /// Draw until an excerpt is publishable and not the latest post
    async fn select_candidate(&self) -> Result<Excerpt, PublishError> {
        let attempts = self.config.max_selection_attempts;

        for attempt in 1..=attempts {
            let candidate = self
                .bounded("get_random_excerpt", self.store.get_random_excerpt())
                .await?
                .map_err(PublishError::Storage)?;

            if !candidate.is_publishable() {
                debug!(attempt, length = candidate.len(), "Skipping unpublishable excerpt");
                continue;
            }
            if self.recent.is_head(&candidate) {
                debug!(attempt, "Skipping excerpt that was just published");
                continue;
            }
            return Ok(candidate);
        }

        Err(PublishError::NoEligibleCandidate { attempts })
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = T>,
    ) -> Result<T, PublishError> {
        tokio::time::timeout(self.config.call_timeout, call)
            .await
            .map_err(|_| PublishError::Timeout { operation })
    }
}
