use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{DecisionStore, StoredDecision};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Decision records in a SQLite database
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open the database file, creating it and its directory when missing.
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        if let Some(dir) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::Connection {
                message: format!("Cannot create {}: {}", dir.display(), e),
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);

        Self::open(options, config.max_connections).await
    }

    /// Private in-memory database. A single connection keeps every query on
    /// the same database.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Bad in-memory URL: {}", e),
            }
        })?;

        Self::open(options, 1).await
    }

    async fn open(options: SqliteConnectOptions, max_connections: u32) -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: e.to_string(),
            })?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StorageError::Migration {
                message: e.to_string(),
            })?;
        info!(max_connections, "Decision store ready");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DecisionStore for SqliteStorage {
    async fn save(
        &self,
        decision: &str,
        response: &serde_json::Value,
        model_used: &str,
        fallback_used: bool,
    ) -> StorageResult<i64> {
        let response = serde_json::to_string(response)?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            r#"
            INSERT INTO decisions (decision, response, model_used, fallback_used, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(decision)
        .bind(&response)
        .bind(model_used)
        .bind(i64::from(fallback_used))
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, model_used, fallback_used, "Decision saved");
        Ok(id)
    }

    async fn get(&self, id: i64) -> StorageResult<Option<StoredDecision>> {
        let row: Option<DecisionRow> = sqlx::query_as(
            r#"
            SELECT id, decision, response, model_used, fallback_used, created_at
            FROM decisions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn recent(&self, limit: u32) -> StorageResult<Vec<StoredDecision>> {
        let rows: Vec<DecisionRow> = sqlx::query_as(
            r#"
            SELECT id, decision, response, model_used, fallback_used, created_at
            FROM decisions
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct DecisionRow {
    id: i64,
    decision: String,
    response: String,
    model_used: String,
    fallback_used: i64,
    created_at: String,
}

impl From<DecisionRow> for StoredDecision {
    fn from(row: DecisionRow) -> Self {
        let response = serde_json::from_str(&row.response).unwrap_or_else(|e| {
            warn!(id = row.id, error = %e, "Stored response is not valid JSON");
            serde_json::Value::String(row.response.clone())
        });

        Self {
            id: row.id,
            decision: row.decision,
            response,
            model_used: row.model_used,
            fallback_used: row.fallback_used != 0,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}
