//! # excerpt-publisher
//!
//! Imports quotable excerpts into SQLite and periodically publishes one of
//! them to a social posting API.
//!
//! ## Design
//!
//! - **Streaming import** - the source file is decoded record by record and
//!   stored in batches, with backpressure between the two stages
//! - **Bounded selection** - random picks are filtered by length and by the
//!   last post, with a hard cap on draws per cycle
//! - **Library-first** - the binary only loads configuration and waits for a
//!   signal; everything else is usable from tests
//!
//! ## Quick Start
//!
//! ```no_run
//! use excerpt_publisher::{Bot, Config, run_until_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.twitter.consumer_key = "key".to_string();
//!     config.twitter.consumer_secret = "secret".to_string();
//!     config.twitter.access_token = "token".to_string();
//!     config.twitter.access_secret = "token-secret".to_string();
//!
//!     let bot = Bot::new(config).await?;
//!     run_until_signal(bot).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Process bootstrap
pub mod bot;
/// Configuration types
pub mod config;
/// SQLite persistence layer
pub mod db;
/// Error types
pub mod error;
/// Streaming excerpt import
pub mod import;
/// Publish scheduler
pub mod publisher;
/// Anti-repeat queue
pub mod queue;
/// Storage contract
pub mod storage;
/// Outbound publishing
pub mod transport;
/// Core types
pub mod types;

// unwrap/expect are acceptable in test fakes
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use bot::Bot;
pub use config::Config;
pub use db::Database;
pub use error::{DatabaseError, Error, ImportError, PublishError, Result};
pub use import::{ImportReport, import_excerpts, import_file};
pub use publisher::{CycleOutcome, PublishScheduler};
pub use queue::RecentExcerpts;
pub use storage::ExcerptStore;
pub use transport::{PostTransport, XClient};
pub use types::{Excerpt, PublishAttempt, PublishFailure, PublishSuccess, Series};

use tokio_util::sync::CancellationToken;

/// Run the bot until a termination signal arrives.
///
/// The signal cancels the scheduler; a publish cycle already in flight is
/// allowed to finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use excerpt_publisher::{Bot, Config, run_until_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let bot = Bot::new(Config::default()).await?;
///     run_until_signal(bot).await?;
///     Ok(())
/// }
/// ```
pub async fn run_until_signal(bot: Bot) -> Result<()> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
    });

    bot.run(cancel).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
