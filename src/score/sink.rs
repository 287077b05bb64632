//! Score Sink
//!
//! Validates game-over reports and hands good ones to the persistence
//! collaborator. Fire-and-forget by design: the submitting connection is
//! never told about validation or persistence failures, and persistence
//! I/O runs on its own task so it cannot stall the relay.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{error, warn};

use super::store::{ScoreRecord, ScoreStore};

/// Accepts game-over reports on behalf of the relay core.
#[derive(Clone)]
pub struct ScoreSink {
    store: Arc<dyn ScoreStore>,
}

impl ScoreSink {
    /// Create a sink backed by `store`.
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Validate one report and dispatch it for persistence.
    ///
    /// Both fields must be present and the score numeric; anything else
    /// is logged and dropped. Returns whether the report passed
    /// validation (persistence itself completes asynchronously).
    pub fn submit(&self, username: Option<&str>, score: Option<&Value>) -> bool {
        let username = match username {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!("dropping game-over report: missing username");
                return false;
            }
        };

        let score = match score.and_then(Value::as_f64) {
            Some(score) => score,
            None => {
                warn!(username = %username, "dropping game-over report: score is not numeric");
                return false;
            }
        };

        let record = ScoreRecord {
            username,
            score,
            timestamp: Utc::now(),
        };

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.save(record).await {
                error!("Failed to persist score record: {}", e);
            }
        });

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::store::{MemoryScoreStore, ScoreError};
    use serde_json::json;
    use std::time::Duration;

    async fn settle() {
        // Give the spawned persistence task a moment to run.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_valid_report_persists_one_record() {
        let store = Arc::new(MemoryScoreStore::new());
        let sink = ScoreSink::new(store.clone());

        assert!(sink.submit(Some("p1"), Some(&json!(500))));
        settle().await;

        let scores = store.top_scores(10).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].username, "p1");
        assert_eq!(scores[0].score, 500.0);
    }

    #[tokio::test]
    async fn test_fractional_score_accepted() {
        let store = Arc::new(MemoryScoreStore::new());
        let sink = ScoreSink::new(store.clone());

        assert!(sink.submit(Some("p1"), Some(&json!(12.5))));
        settle().await;

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_non_numeric_score_dropped() {
        let store = Arc::new(MemoryScoreStore::new());
        let sink = ScoreSink::new(store.clone());

        assert!(!sink.submit(Some("p1"), Some(&json!("not-a-number"))));
        assert!(!sink.submit(Some("p1"), Some(&json!(true))));
        assert!(!sink.submit(Some("p1"), None));
        settle().await;

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_username_dropped() {
        let store = Arc::new(MemoryScoreStore::new());
        let sink = ScoreSink::new(store.clone());

        assert!(!sink.submit(None, Some(&json!(500))));
        assert!(!sink.submit(Some(""), Some(&json!(500))));
        settle().await;

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_is_isolated() {
        struct FailingStore;

        #[async_trait::async_trait]
        impl ScoreStore for FailingStore {
            async fn save(&self, _record: ScoreRecord) -> Result<(), ScoreError> {
                Err(ScoreError::Unavailable("connection refused".into()))
            }

            async fn top_scores(&self, _limit: usize) -> Result<Vec<ScoreRecord>, ScoreError> {
                Err(ScoreError::Unavailable("connection refused".into()))
            }
        }

        let sink = ScoreSink::new(Arc::new(FailingStore));

        // Validation passes; the persistence error is logged, not raised.
        assert!(sink.submit(Some("p1"), Some(&json!(500))));
        settle().await;
    }
}
