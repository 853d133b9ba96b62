//! Integration tests for SQLite storage layer
//!
//! Tests database operations using in-memory and file-backed SQLite databases.

use chrono::{Duration, Utc};
use serde_json::json;

use decision_impact_simulator::config::DatabaseConfig;
use decision_impact_simulator::storage::{DecisionStore, SqliteStorage};

/// Create an in-memory storage instance for testing
async fn create_test_storage() -> SqliteStorage {
    SqliteStorage::new_in_memory()
        .await
        .expect("Failed to create in-memory storage")
}

#[tokio::test]
async fn test_save_and_get_round_trip() {
    let storage = create_test_storage().await;
    let response = json!({"decision_summary": "Buy the laptop", "confidence_score": 61});

    let before = Utc::now();
    let id = storage
        .save(
            "Buying an expensive laptop on EMI",
            &response,
            "groq:llama-3.1-8b-instant",
            false,
        )
        .await
        .unwrap();

    let stored = storage.get(id).await.unwrap().expect("record should exist");
    assert_eq!(stored.id, id);
    assert_eq!(stored.decision, "Buying an expensive laptop on EMI");
    assert_eq!(stored.response, response);
    assert_eq!(stored.model_used, "groq:llama-3.1-8b-instant");
    assert!(!stored.fallback_used);
    assert!(stored.created_at >= before - Duration::seconds(1));
    assert!(stored.created_at <= Utc::now() + Duration::seconds(1));
}

#[tokio::test]
async fn test_ids_auto_increment() {
    let storage = create_test_storage().await;
    let first = storage
        .save("First decision text", &json!({}), "m", false)
        .await
        .unwrap();
    let second = storage
        .save("Second decision text", &json!({}), "m", true)
        .await
        .unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn test_fallback_flag_stored_as_integer() {
    let storage = create_test_storage().await;
    let id = storage
        .save("Fallback decision", &json!({}), "groq:fallback", true)
        .await
        .unwrap();

    let raw: (i64, String) =
        sqlx::query_as("SELECT fallback_used, created_at FROM decisions WHERE id = ?")
            .bind(id)
            .fetch_one(storage.pool())
            .await
            .unwrap();
    assert_eq!(raw.0, 1);
    assert!(raw.1.ends_with('Z'), "created_at should be UTC: {}", raw.1);
    assert!(chrono::DateTime::parse_from_rfc3339(&raw.1).is_ok());

    assert!(storage.get(id).await.unwrap().unwrap().fallback_used);
}

#[tokio::test]
async fn test_get_missing_record() {
    let storage = create_test_storage().await;
    assert!(storage.get(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_recent_is_newest_first_and_limited() {
    let storage = create_test_storage().await;
    for i in 0..5 {
        storage
            .save(&format!("Decision number {}", i), &json!({"n": i}), "m", false)
            .await
            .unwrap();
    }

    let recent = storage.recent(3).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].decision, "Decision number 4");
    assert_eq!(recent[2].decision, "Decision number 2");
}

#[tokio::test]
async fn test_file_database_created_with_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("decisions.db");
    let config = DatabaseConfig {
        path: path.clone(),
        max_connections: 2,
    };

    let id = {
        let storage = SqliteStorage::new(&config).await.unwrap();
        storage
            .save("Persisted across reopen", &json!({"ok": true}), "m", false)
            .await
            .unwrap()
    };
    assert!(path.exists());

    // Reopening runs migrations again and keeps existing rows
    let storage = SqliteStorage::new(&config).await.unwrap();
    let stored = storage.get(id).await.unwrap().unwrap();
    assert_eq!(stored.decision, "Persisted across reopen");
}
