//! End-to-end flow against a real SQLite file and a mocked posting API
//!
//! The bot imports a small source, then publishes on a one-second period
//! until cancelled. Outcomes are read back through the audit queries.

mod common;

use common::{excerpt_source, test_config};
use excerpt_publisher::{Bot, Database, Error, ImportError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn records() -> serde_json::Value {
    serde_json::json!([
        { "series": 1, "part": "Part I", "chapter": "Chapter 1", "excerpt": "They were all dead." },
        { "series": 1, "part": "Part I", "chapter": "Chapter 1", "excerpt": "Past tense." },
        { "series": 2, "part": "Part II", "chapter": "Chapter 3", "excerpt": "The sky was black." },
    ])
}

#[tokio::test]
async fn imports_and_records_published_posts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": { "id": "42", "text": "posted", "edit_history_tweet_ids": ["42"] }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let source = excerpt_source(records());
    let config = test_config(
        dir.path(),
        source.path(),
        format!("{}/2/tweets", server.uri()),
    );
    let db_path = config.database.path.clone();

    let bot = Bot::new(config).await.expect("bot");
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(bot.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    cancel.cancel();
    handle.await.expect("join").expect("bot run");

    let db = Database::new(&db_path).await.expect("reopen");
    assert_eq!(db.count_excerpts().await.expect("count"), 3);

    let posts = db.list_successful_posts(10).await.expect("list");
    assert!(!posts.is_empty(), "at least one cycle should have run");
    assert!(posts.iter().all(|p| p.post_id == "42"));
    // Recorded against the stored excerpt, not the text echoed by the API
    for post in &posts {
        assert!(db.get_excerpt(&post.text).await.expect("lookup").is_some());
    }
    assert!(db.list_failed_posts(10).await.expect("list").is_empty());
    db.close().await;
}

#[tokio::test]
async fn rejections_are_stored_with_their_excerpt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "title": "Forbidden",
            "type": "about:blank",
            "detail": "You are not allowed to create a Tweet with duplicate content.",
            "status": 403
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("temp dir");
    let source = excerpt_source(records());
    let config = test_config(
        dir.path(),
        source.path(),
        format!("{}/2/tweets", server.uri()),
    );
    let db_path = config.database.path.clone();

    let bot = Bot::new(config).await.expect("bot");
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(bot.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    cancel.cancel();
    handle.await.expect("join").expect("bot run");

    let db = Database::new(&db_path).await.expect("reopen");
    let failures = db.list_failed_posts(10).await.expect("list");
    assert!(!failures.is_empty());
    let (text, failure) = &failures[0];
    assert!(db.get_excerpt(text).await.expect("lookup").is_some());
    assert_eq!(failure.status, 403);
    assert_eq!(failure.kind, "about:blank");
    assert!(db.list_successful_posts(10).await.expect("list").is_empty());
    db.close().await;
}

#[tokio::test]
async fn second_run_reports_duplicate_import() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("temp dir");
    let source = excerpt_source(records());
    let endpoint = format!("{}/2/tweets", server.uri());

    let first = Bot::new(test_config(dir.path(), source.path(), endpoint.clone()))
        .await
        .expect("bot");
    let cancel = CancellationToken::new();
    cancel.cancel();
    first.run(cancel).await.expect("first run");

    let second = Bot::new(test_config(dir.path(), source.path(), endpoint))
        .await
        .expect("bot");
    let result = second.run(CancellationToken::new()).await;

    match result {
        Err(Error::Import(e)) => assert!(matches!(*e, ImportError::Storage { batch: 1, .. })),
        other => panic!("expected duplicate import error, got {other:?}"),
    }
}
