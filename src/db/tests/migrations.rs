use crate::db::*;
use crate::storage::ExcerptStore;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_database_creation() {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path();

    let db = Database::new(db_path).await.unwrap();

    let mut conn = db.pool.acquire().await.unwrap();

    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(&mut *conn)
            .await
            .unwrap();

    assert!(tables.contains(&"excerpts".to_string()));
    assert!(tables.contains(&"successful_posts".to_string()));
    assert!(tables.contains(&"failed_posts".to_string()));
    assert!(tables.contains(&"schema_version".to_string()));

    drop(conn);
    db.close().await;
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    // Schema creation through the store contract must not re-apply v1
    db.create_schema_if_absent().await.unwrap();
    db.create_schema_if_absent().await.unwrap();

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(db.pool())
        .await
        .unwrap();
    assert_eq!(versions, vec![1]);

    db.close().await;
}

#[tokio::test]
async fn test_reopen_existing_database() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("nested").join("excerpts.db");

    let db = Database::new(&db_path).await.unwrap();
    db.insert_excerpts(&[crate::types::Excerpt::new(
        crate::types::Series::Original,
        "Part I",
        "Prologue",
        "The sun had set.",
    )])
    .await
    .unwrap();
    db.close().await;

    let reopened = Database::new(&db_path).await.unwrap();
    assert_eq!(reopened.count_excerpts().await.unwrap(), 1);
    reopened.close().await;
}
