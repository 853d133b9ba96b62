//! Storage layer for analysed decisions.
//!
//! Records are append-only: the service writes one row per successful
//! analysis and never updates or deletes it.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// A persisted analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDecision {
    /// Auto-increment row id.
    pub id: i64,
    /// Decision text as submitted.
    pub decision: String,
    /// The analysis, as JSON.
    pub response: serde_json::Value,
    /// Backend identifier that produced the analysis.
    pub model_used: String,
    /// Whether a fallback backend produced it.
    pub fallback_used: bool,
    /// When the record was written (UTC).
    pub created_at: DateTime<Utc>,
}

/// Append-only sink for completed analyses.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Append a record and return its id.
    async fn save(
        &self,
        decision: &str,
        response: &serde_json::Value,
        model_used: &str,
        fallback_used: bool,
    ) -> StorageResult<i64>;

    /// Fetch a record by id.
    async fn get(&self, id: i64) -> StorageResult<Option<StoredDecision>>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: u32) -> StorageResult<Vec<StoredDecision>>;
}
