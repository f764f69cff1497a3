//! In-memory match store for unit testing.
//!
//! This module provides a store that can be used in tests without a running
//! database, including simulated write failures at a chosen batch position.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::MatchStore;
use crate::error::PersistenceError;
use crate::model::MatchRecord;

/// In-memory match store for testing.
#[derive(Debug, Default)]
pub struct MemoryMatchStore {
    records: Mutex<HashMap<i32, MatchRecord>>,
    /// Zero-based batch position at which a write failure is simulated.
    fail_on_record: Option<usize>,
}

impl MemoryMatchStore {
    /// Create an empty store that accepts every batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose next batches fail at the given record position.
    pub fn failing_at(position: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_on_record: Some(position),
        }
    }

    /// All stored records, ordered by fixture id.
    pub fn records(&self) -> Vec<MatchRecord> {
        let map = self.records.lock().unwrap();
        let mut records: Vec<MatchRecord> = map.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn persist_batch(&self, records: &[MatchRecord]) -> Result<(), PersistenceError> {
        // Mirror the transactional contract: stage the whole batch first so
        // a mid-batch failure leaves nothing visible.
        let mut staged = Vec::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if self.fail_on_record == Some(position) {
                return Err(PersistenceError::Database(sqlx::Error::Protocol(
                    format!("simulated write failure at record {position}"),
                )));
            }
            staged.push(record.clone());
        }

        let mut map = self.records.lock().unwrap();
        for record in staged {
            map.insert(record.id, record);
        }
        Ok(())
    }

    async fn all_matches(&self) -> Result<Vec<MatchRecord>, PersistenceError> {
        Ok(self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchCandidate, ScoreOddsMap};
    use crate::normalizer::OutcomeOdds;

    fn record(id: i32) -> MatchRecord {
        let candidate = MatchCandidate {
            fixture_id: id,
            home_team_id: 33,
            home_team_name: "Manchester United".to_string(),
            away_team_id: 40,
            away_team_name: "Liverpool".to_string(),
            score_odds: ScoreOddsMap::new(),
        };
        MatchRecord::from_candidate(
            &candidate,
            OutcomeOdds {
                home_win: 2.0,
                draw: 4.0,
                away_win: 4.0,
            },
        )
    }

    #[tokio::test]
    async fn persists_and_returns_batches() {
        let store = MemoryMatchStore::new();

        store.persist_batch(&[record(2), record(1)]).await.unwrap();

        let matches = store.all_matches().await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, 1);
        assert_eq!(matches[1].id, 2);
    }

    #[tokio::test]
    async fn reprocessed_fixture_overwrites_previous_record() {
        let store = MemoryMatchStore::new();

        store.persist_batch(&[record(7)]).await.unwrap();
        store.persist_batch(&[record(7)]).await.unwrap();

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn mid_batch_failure_leaves_nothing_visible() {
        let store = MemoryMatchStore::failing_at(1);

        let result = store
            .persist_batch(&[record(1), record(2), record(3)])
            .await;

        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
