//! Outbound publishing
//!
//! The publish scheduler only knows [`PostTransport`]. [`XClient`] is the
//! production implementation talking to the X (Twitter) v2 API.

use crate::types::PublishAttempt;
use async_trait::async_trait;

mod oauth;
mod x_client;

pub use oauth::OAuthCredentials;
pub use x_client::XClient;

/// Something that can publish a post
///
/// Every outcome is reported through [`PublishAttempt`] so callers match on
/// success, structured rejection and opaque failure explicitly.
///
/// # Examples
///
/// ```no_run
/// use excerpt_publisher::config::TwitterConfig;
/// use excerpt_publisher::transport::{PostTransport, XClient};
/// use excerpt_publisher::types::PublishAttempt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = XClient::new(&TwitterConfig::default())?;
/// match client.publish("Hello").await {
///     PublishAttempt::Published(post) => println!("posted {}", post.post_id),
///     PublishAttempt::Rejected(problem) => println!("rejected: {problem}"),
///     PublishAttempt::Failed(e) => println!("failed: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait PostTransport: Send + Sync {
    /// Publish `text` as a new post
    async fn publish(&self, text: &str) -> PublishAttempt;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
