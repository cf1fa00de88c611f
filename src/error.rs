//! Error types for excerpt-publisher
//!
//! The crate-wide [`Error`] covers storage, transport and configuration
//! failures. The two long-running components report through their own
//! types so callers can tell which step went wrong:
//! - [`ImportError`] for the ingestion pipeline
//! - [`PublishError`] for a single publish cycle

use thiserror::Error;

/// Result type alias for excerpt-publisher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for excerpt-publisher
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "import.batch_size")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The platform answered with something that is neither a post nor a problem report
    #[error("unexpected response (HTTP {status}): {body}")]
    UnexpectedResponse {
        /// HTTP status code of the response
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Startup import failed
    #[error("import failed: {0}")]
    Import(#[source] Box<ImportError>),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

impl From<ImportError> for Error {
    fn from(e: ImportError) -> Self {
        Error::Import(Box::new(e))
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Errors that abort an excerpt import
#[derive(Debug, Error)]
pub enum ImportError {
    /// A record in the source could not be decoded
    #[error("failed to decode excerpt #{index}: {source}")]
    Decode {
        /// Zero-based position of the record in the source array
        index: usize,
        /// Underlying decoder error
        #[source]
        source: serde_json::Error,
    },

    /// The source does not have the expected `{"excerpts": [...]}` shape
    #[error("malformed excerpt source: {0}")]
    Malformed(String),

    /// A batch could not be stored
    #[error("failed to store batch {batch}: {source}")]
    Storage {
        /// One-based number of the batch that failed
        batch: usize,
        /// Underlying storage error
        #[source]
        source: Error,
    },

    /// Opening or reading the source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decoder task stopped without reporting why
    #[error("decoder task aborted: {0}")]
    Aborted(String),
}

/// Errors from a single publish cycle
///
/// None of these stop the scheduler; they are logged and the next tick
/// proceeds normally.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Storage failed while selecting or recording
    #[error("storage error: {0}")]
    Storage(#[source] Error),

    /// The transport failed without a structured answer
    #[error("transport error: {0}")]
    Transport(#[source] Error),

    /// No excerpt passed the eligibility and anti-repeat filters
    #[error("no eligible excerpt found after {attempts} attempts")]
    NoEligibleCandidate {
        /// Number of candidates that were drawn and rejected
        attempts: u32,
    },

    /// An external call did not finish in time
    #[error("{operation} timed out")]
    Timeout {
        /// Which call timed out
        operation: &'static str,
    },

    /// The post went out but its outcome could not be stored
    #[error("post {post_id} was published but its outcome was not recorded: {source}")]
    Unrecorded {
        /// Platform identifier of the published post
        post_id: String,
        /// Underlying storage error
        #[source]
        source: Error,
    },
}
