//! Core types for excerpt-publisher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Maximum length of a single post on the target platform, in characters
pub const MAX_POST_LENGTH: usize = 280;

/// The work an excerpt was taken from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Series {
    /// Unknown or unset source work
    #[default]
    Unspecified,
    /// The first game
    Original,
    /// The second game
    TheFallOfMaxPayne,
}

impl Series {
    /// Convert to the integer stored in the database
    pub fn to_i32(self) -> i32 {
        match self {
            Series::Unspecified => 0,
            Series::Original => 1,
            Series::TheFallOfMaxPayne => 2,
        }
    }

    /// Convert from the stored integer; unknown values map to `Unspecified`
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => Series::Original,
            2 => Series::TheFallOfMaxPayne,
            _ => Series::Unspecified,
        }
    }
}

impl From<i32> for Series {
    fn from(value: i32) -> Self {
        Series::from_i32(value)
    }
}

impl From<Series> for i32 {
    fn from(series: Series) -> Self {
        series.to_i32()
    }
}

impl std::fmt::Display for Series {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Series::Original => write!(f, "1"),
            Series::TheFallOfMaxPayne => write!(f, "The Fall of Max Payne"),
            Series::Unspecified => write!(f, "0"),
        }
    }
}

/// A short, immutable unit of quotable text
///
/// The text is the natural key: two excerpts with the same text are the same
/// excerpt, regardless of where they claim to come from.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Excerpt {
    /// Source work
    #[serde(rename = "series", alias = "seriesId", default)]
    pub series: Series,
    /// Part label within the work
    #[serde(default)]
    pub part: String,
    /// Chapter label within the part
    #[serde(default)]
    pub chapter: String,
    /// The quotable text
    #[serde(rename = "excerpt", alias = "text", default)]
    pub text: String,
}

impl Excerpt {
    /// Create a new excerpt
    pub fn new(
        series: Series,
        part: impl Into<String>,
        chapter: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            series,
            part: part.into(),
            chapter: chapter.into(),
            text: text.into(),
        }
    }

    /// Length of the text in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the excerpt fits in a single post and has something to say
    pub fn is_publishable(&self) -> bool {
        !self.is_empty() && self.len() <= MAX_POST_LENGTH
    }
}

impl PartialEq for Excerpt {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Excerpt {}

impl std::hash::Hash for Excerpt {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

/// A post the platform accepted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSuccess {
    /// When the post was accepted
    pub posted_at: DateTime<Utc>,
    /// Text of the stored excerpt that was posted
    pub text: String,
    /// Platform identifier of the post
    pub post_id: String,
    /// Revision identifiers reported by the platform
    pub edit_history_ids: Vec<String>,
}

/// A structured rejection from the platform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishFailure {
    /// When the rejection was received
    pub failed_at: DateTime<Utc>,
    /// Human-readable title
    pub title: String,
    /// Machine-readable problem type
    #[serde(rename = "type")]
    pub kind: String,
    /// Detail message
    pub detail: String,
    /// HTTP status reported in the problem body
    pub status: i32,
}

impl std::fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "title: {}, type: {}, detail: {}, status: {}",
            self.title, self.kind, self.detail, self.status
        )
    }
}

/// Outcome of a single call to a [`PostTransport`](crate::transport::PostTransport)
#[derive(Debug)]
pub enum PublishAttempt {
    /// The platform accepted the post
    Published(PublishSuccess),
    /// The platform explicitly rejected the post
    Rejected(PublishFailure),
    /// The call failed without a structured answer
    Failed(Error),
}
