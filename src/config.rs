//! Configuration types for excerpt-publisher

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Main configuration
///
/// Loaded from a JSON file; every section and field has a default so a
/// partial file (typically just the `twitter` credentials) is enough.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// SQLite storage settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Startup import settings
    #[serde(default)]
    pub import: ImportConfig,

    /// Publish scheduler settings
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Platform credentials and endpoint
    #[serde(default)]
    pub twitter: TwitterConfig,
}

impl Config {
    /// Read and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Location of the configuration file
    ///
    /// An explicit path wins; otherwise `configs/app.{environment}.json`,
    /// with `development` when no environment is named.
    pub fn resolve_path(explicit: Option<String>, environment: Option<String>) -> PathBuf {
        if let Some(path) = explicit.filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        let environment = environment
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "development".to_string());
        PathBuf::from("configs").join(format!("app.{environment}.json"))
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.import.batch_size == 0 {
            return Err(Error::config("import.batch_size", "must be at least 1"));
        }
        if self.publisher.period.is_zero() {
            return Err(Error::config("publisher.period", "must be greater than zero"));
        }
        if self.publisher.anti_repeat_capacity == 0 {
            return Err(Error::config(
                "publisher.anti_repeat_capacity",
                "must be at least 1",
            ));
        }
        if self.publisher.max_selection_attempts == 0 {
            return Err(Error::config(
                "publisher.max_selection_attempts",
                "must be at least 1",
            ));
        }
        if let Err(e) = url::Url::parse(&self.twitter.endpoint) {
            return Err(Error::config(
                "twitter.endpoint",
                format!("invalid URL {:?}: {}", self.twitter.endpoint, e),
            ));
        }
        Ok(())
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database path (default: "./excerpts.db")
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Startup import configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Whether to import the source file before publishing starts (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the JSON excerpt source (default: "./data/excerpts.json")
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// Number of excerpts stored per transaction (default: 100)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source_path: default_source_path(),
            batch_size: default_batch_size(),
        }
    }
}

/// Publish scheduler configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Time between publish cycles (default: 6 hours)
    #[serde(default = "default_period", with = "duration_serde")]
    pub period: Duration,

    /// How many recent posts to remember for repeat suppression (default: 20)
    #[serde(default = "default_anti_repeat_capacity")]
    pub anti_repeat_capacity: usize,

    /// Candidates drawn per cycle before giving up (default: 50)
    #[serde(default = "default_max_selection_attempts")]
    pub max_selection_attempts: u32,

    /// Upper bound for each storage or transport call (default: 30 seconds)
    #[serde(default = "default_call_timeout", with = "duration_serde")]
    pub call_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            period: default_period(),
            anti_repeat_capacity: default_anti_repeat_capacity(),
            max_selection_attempts: default_max_selection_attempts(),
            call_timeout: default_call_timeout(),
        }
    }
}

/// Credentials and endpoint for the posting API (OAuth 1.0a user context)
#[derive(Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// API key
    #[serde(default)]
    pub consumer_key: String,
    /// API key secret
    #[serde(default)]
    pub consumer_secret: String,
    /// User access token
    #[serde(default)]
    pub access_token: String,
    /// User access token secret
    #[serde(default)]
    pub access_secret: String,
    /// Create-post endpoint (default: "https://api.twitter.com/2/tweets")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_secret: String::new(),
            endpoint: default_endpoint(),
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./excerpts.db")
}

fn default_source_path() -> PathBuf {
    PathBuf::from("./data/excerpts.json")
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    100
}

fn default_period() -> Duration {
    Duration::from_secs(6 * 60 * 60) // four posts a day
}

fn default_anti_repeat_capacity() -> usize {
    20
}

fn default_max_selection_attempts() -> u32 {
    50
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_endpoint() -> String {
    "https://api.twitter.com/2/tweets".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_object_yields_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.database.path, PathBuf::from("./excerpts.db"));
        assert!(config.import.enabled);
        assert_eq!(config.import.batch_size, 100);
        assert_eq!(config.publisher.period, Duration::from_secs(21600));
        assert_eq!(config.publisher.anti_repeat_capacity, 20);
        assert_eq!(config.twitter.endpoint, "https://api.twitter.com/2/tweets");
        config.validate().unwrap();
    }

    #[test]
    fn durations_are_read_as_seconds() {
        let config: Config = serde_json::from_str(
            r#"{"publisher": {"period": 60, "call_timeout": 5}, "import": {"batch_size": 10}}"#,
        )
        .unwrap();

        assert_eq!(config.publisher.period, Duration::from_secs(60));
        assert_eq!(config.publisher.call_timeout, Duration::from_secs(5));
        assert_eq!(config.import.batch_size, 10);
    }

    #[test]
    fn twitter_keys_are_snake_case_like_other_sections() {
        let config: Config = serde_json::from_str(
            r#"{"twitter": {"consumer_key": "ck", "consumer_secret": "cs", "access_token": "at", "access_secret": "as"}}"#,
        )
        .unwrap();

        assert_eq!(config.twitter.consumer_key, "ck");
        assert_eq!(config.twitter.access_secret, "as");

        let camel: Config =
            serde_json::from_str(r#"{"twitter": {"consumerKey": "ck"}}"#).unwrap();
        assert!(camel.twitter.consumer_key.is_empty());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let twitter = TwitterConfig {
            consumer_secret: "super-secret".to_string(),
            ..Default::default()
        };
        let rendered = format!("{twitter:?}");
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut config = Config::default();
        config.import.batch_size = 0;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("import.batch_size")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_period_and_bad_endpoint_are_rejected() {
        let mut config = Config::default();
        config.publisher.period = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.twitter.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_path_prefers_explicit_then_environment() {
        assert_eq!(
            Config::resolve_path(Some("/etc/bot.json".into()), Some("production".into())),
            PathBuf::from("/etc/bot.json")
        );
        assert_eq!(
            Config::resolve_path(None, Some("production".into())),
            PathBuf::from("configs/app.production.json")
        );
        assert_eq!(
            Config::resolve_path(Some(String::new()), None),
            PathBuf::from("configs/app.development.json")
        );
    }

    #[test]
    fn from_file_reads_and_validates() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"import": {{"batch_size": 25, "enabled": false}}}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.import.batch_size, 25);
        assert!(!config.import.enabled);

        let mut invalid = NamedTempFile::new().unwrap();
        write!(invalid, r#"{{"publisher": {{"anti_repeat_capacity": 0}}}}"#).unwrap();
        assert!(Config::from_file(invalid.path()).is_err());
    }
}
