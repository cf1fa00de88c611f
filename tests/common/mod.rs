//! Common test utilities for excerpt-publisher integration tests

use excerpt_publisher::Config;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Write `{"excerpts": records}` to a temporary file
pub fn excerpt_source(records: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create source file");
    let doc = serde_json::json!({ "excerpts": records });
    file.write_all(&serde_json::to_vec(&doc).expect("encode source"))
        .expect("write source file");
    file
}

/// Configuration pointing at a temp database, a source file and a mock endpoint
pub fn test_config(dir: &Path, source: &Path, endpoint: String) -> Config {
    let mut config = Config::default();
    config.database.path = dir.join("excerpts.db");
    config.import.source_path = source.to_path_buf();
    config.import.batch_size = 2;
    config.publisher.period = Duration::from_secs(1);
    config.publisher.call_timeout = Duration::from_secs(5);
    config.twitter.consumer_key = "ck".to_string();
    config.twitter.consumer_secret = "cs".to_string();
    config.twitter.access_token = "at".to_string();
    config.twitter.access_secret = "as".to_string();
    config.twitter.endpoint = endpoint;
    config
}
