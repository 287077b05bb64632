//! Score Persistence Collaborator
//!
//! The trait the relay core hands final scores to, plus the in-memory
//! implementation. Real deployments inject a store backed by whatever
//! the REST layer's database is.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One final score handed off by the relay core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Name the score is recorded under.
    pub username: String,
    /// Final score.
    pub score: f64,
    /// When the game-over report was accepted.
    pub timestamp: DateTime<Utc>,
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// External persistence collaborator for score records.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Persist one record.
    async fn save(&self, record: ScoreRecord) -> Result<(), ScoreError>;

    /// Best scores first, at most `limit` records. This is the read
    /// model the REST leaderboard endpoint queries.
    async fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, ScoreError>;
}

/// In-memory store: appends every record, queried in score order.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    records: RwLock<Vec<ScoreRecord>>,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of persisted records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no records have been persisted.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn save(&self, record: ScoreRecord) -> Result<(), ScoreError> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, ScoreError> {
        let records = self.records.read().await;
        let mut sorted: Vec<ScoreRecord> = records.clone();
        sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        sorted.truncate(limit);
        Ok(sorted)
    }
}
