//! Test Deck Store
//!
//! Plays the persistence collaborator for end-to-end tests:
//! - Scheduling rows keyed by card id, review history appended per review
//! - Backed by a JSON file in a temporary directory, reloadable from disk
//! - Snapshots and restoration

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cadence_core::{
    submit_review, CardScheduling, Rating, ReviewLogRecord, ReviewOutcome, ReviewRequest,
    Scheduler, SchedulerError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Everything the store persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckData {
    pub cards: BTreeMap<String, CardScheduling>,
    pub review_logs: Vec<ReviewLogRecord>,
}

/// Deck store for tests
///
/// Each instance lives in its own temporary directory, removed on drop.
///
/// # Example
///
/// ```rust,ignore
/// let mut store = TestDeckStore::new_temp();
/// store.add_card("card-1", now);
/// store.review("card-1", Rating::Good, now)?;
/// store.persist();
/// ```
pub struct TestDeckStore {
    pub scheduler: Scheduler,
    data: DeckData,
    /// Kept alive so the directory outlives the store
    _temp_dir: TempDir,
    path: PathBuf,
    snapshot: Option<DeckData>,
}

impl TestDeckStore {
    /// Empty store with the default scheduler
    pub fn new_temp() -> Self {
        Self::with_scheduler(Scheduler::default())
    }

    pub fn with_scheduler(scheduler: Scheduler) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("deck.json");

        let store = Self {
            scheduler,
            data: DeckData::default(),
            _temp_dir: temp_dir,
            path,
            snapshot: None,
        };
        store.persist();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn card_count(&self) -> usize {
        self.data.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.cards.is_empty()
    }

    pub fn card(&self, card_id: &str) -> Option<&CardScheduling> {
        self.data.cards.get(card_id)
    }

    pub fn cards(&self) -> Vec<CardScheduling> {
        self.data.cards.values().cloned().collect()
    }

    pub fn review_logs(&self) -> &[ReviewLogRecord] {
        &self.data.review_logs
    }

    /// History rows for one card, in review order
    pub fn logs_for(&self, card_id: &str) -> Vec<&ReviewLogRecord> {
        self.data
            .review_logs
            .iter()
            .filter(|log| log.card_id.as_deref() == Some(card_id))
            .collect()
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Create a new card row, due at `now`
    pub fn add_card(&mut self, card_id: &str, now: DateTime<Utc>) -> &CardScheduling {
        let mut row = CardScheduling::new_card(card_id, now);
        row.user_id = Some("test-user".to_string());
        self.data.cards.insert(card_id.to_string(), row);
        &self.data.cards[card_id]
    }

    /// Insert or replace a row as-is
    pub fn put_card(&mut self, row: CardScheduling) {
        let card_id = row.card_id.clone().expect("Row needs a card id");
        self.data.cards.insert(card_id, row);
    }

    /// Submit a review the way the application does: schedule, write the
    /// row update, append the history row.
    pub fn review(
        &mut self,
        card_id: &str,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, SchedulerError> {
        self.review_raw(card_id, i64::from(rating.value()), now)
    }

    /// Same as [`TestDeckStore::review`] with an unchecked integer rating
    pub fn review_raw(
        &mut self,
        card_id: &str,
        rating: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, SchedulerError> {
        let row = self
            .data
            .cards
            .get_mut(card_id)
            .ok_or_else(|| SchedulerError::InvalidState(format!("no card {}", card_id)))?;

        let request = ReviewRequest {
            scheduling: row.clone(),
            rating,
            duration_ms: Some(3_000),
        };
        let outcome = submit_review(&self.scheduler, &request, now)?;

        row.apply(&outcome.scheduling, now);
        self.data.review_logs.push(outcome.review_log.clone());
        Ok(outcome)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Write the deck to disk
    pub fn persist(&self) {
        let json = serde_json::to_string_pretty(&self.data).expect("Failed to serialize deck");
        std::fs::write(&self.path, json).expect("Failed to write deck");
    }

    /// Replace in-memory data with what is on disk
    pub fn reload(&mut self) {
        let json = std::fs::read_to_string(&self.path).expect("Failed to read deck");
        self.data = serde_json::from_str(&json).expect("Failed to parse deck");
    }

    // ========================================================================
    // SNAPSHOT/RESTORE
    // ========================================================================

    pub fn take_snapshot(&mut self) {
        self.snapshot = Some(self.data.clone());
    }

    /// Restore the last snapshot; false when there is none
    pub fn restore_snapshot(&mut self) -> bool {
        match self.snapshot.take() {
            Some(data) => {
                self.data = data;
                true
            }
            None => false,
        }
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn clear(&mut self) {
        self.data = DeckData::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_temp_store_creation() {
        let store = TestDeckStore::new_temp();
        assert!(store.is_empty());
        assert!(store.path().exists());
    }

    #[test]
    fn test_review_updates_row_and_log() {
        let mut store = TestDeckStore::new_temp();
        store.add_card("c1", now());

        store.review("c1", Rating::Good, now()).unwrap();

        let row = store.card("c1").unwrap();
        assert_eq!(row.state, "learning");
        assert_eq!(row.updated_at, Some(now()));
        assert_eq!(store.logs_for("c1").len(), 1);
    }

    #[test]
    fn test_review_unknown_card() {
        let mut store = TestDeckStore::new_temp();
        assert!(store.review("missing", Rating::Good, now()).is_err());
    }

    #[test]
    fn test_persist_and_reload() {
        let mut store = TestDeckStore::new_temp();
        store.add_card("c1", now());
        store.review("c1", Rating::Easy, now()).unwrap();
        store.persist();

        let before = store.card("c1").cloned().unwrap();
        store.clear();
        assert!(store.is_empty());

        store.reload();
        let after = store.card("c1").unwrap();
        assert_eq!(after.state, before.state);
        assert_eq!(after.due, before.due);
        assert_eq!(after.reps, before.reps);
        assert!((after.stability - before.stability).abs() < 1e-9);
        assert_eq!(store.review_logs().len(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut store = TestDeckStore::new_temp();
        store.add_card("c1", now());
        store.take_snapshot();
        assert!(store.has_snapshot());

        store.review("c1", Rating::Again, now()).unwrap();
        assert!(store.restore_snapshot());
        assert_eq!(store.card("c1").unwrap().state, "new");
        assert!(store.review_logs().is_empty());
        assert!(!store.restore_snapshot());
    }
}
