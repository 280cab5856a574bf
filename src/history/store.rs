use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::db::DbError;
use crate::history::backing::BackingStore;
use crate::history::filter;
use crate::models::*;

pub const STORAGE_KEY: &str = "coldmail_history";
pub const MAX_MESSAGES: usize = 50;

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Bounded, most-recent-first log of saved messages kept in one backing slot.
///
/// The plain methods never fail: errors are logged and the call degrades to an
/// empty result or a no-op. The `try_` variants expose the error instead.
/// Writes are load-modify-overwrite with no cross-process locking; the last
/// writer wins.
pub struct HistoryStore {
    backend: Arc<dyn BackingStore>,
    key: String,
    capacity: usize,
    clock: Clock,
}

impl HistoryStore {
    pub fn new(backend: Arc<dyn BackingStore>) -> Self {
        Self {
            backend,
            key: STORAGE_KEY.to_string(),
            capacity: MAX_MESSAGES,
            clock: Box::new(now_millis),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn save(&self, record: NewHistoryRecord) -> Option<HistoryRecord> {
        self.try_save(record)
            .map_err(|e| error!(error = %e, "failed to save message to history"))
            .ok()
    }

    pub fn try_save(&self, record: NewHistoryRecord) -> Result<HistoryRecord, DbError> {
        let mut history = self.read_records()?;
        let saved = HistoryRecord {
            id: new_id(),
            content: record.content,
            platform: record.platform,
            tone: record.tone,
            timestamp: (self.clock)(),
            niche: record.niche,
            client_name: record.client_name,
        };

        history.insert(0, saved.clone());
        // The clock may have stepped back; equal timestamps keep newest first.
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if history.len() > self.capacity {
            let evicted = history.len() - self.capacity;
            history.truncate(self.capacity);
            debug!(evicted, "history over capacity, dropped oldest entries");
        }

        self.write_records(&history)?;
        Ok(saved)
    }

    /// All records, newest first. Absent or unreadable data yields an empty list.
    pub fn load(&self) -> Vec<HistoryRecord> {
        self.try_load().unwrap_or_else(|e| {
            error!(error = %e, "failed to read message history");
            Vec::new()
        })
    }

    pub fn try_load(&self) -> Result<Vec<HistoryRecord>, DbError> {
        self.read_records()
    }

    pub fn get(&self, id: &str) -> Option<HistoryRecord> {
        self.load().into_iter().find(|r| r.id == id)
    }

    pub fn delete(&self, id: &str) {
        if let Err(e) = self.try_delete(id) {
            error!(error = %e, id, "failed to delete message from history");
        }
    }

    /// Returns whether a record was removed. Unknown ids are not an error.
    pub fn try_delete(&self, id: &str) -> Result<bool, DbError> {
        let mut history = self.read_records()?;
        let before = history.len();
        history.retain(|r| r.id != id);
        if history.len() == before {
            return Ok(false);
        }
        self.write_records(&history)?;
        Ok(true)
    }

    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            error!(error = %e, "failed to clear message history");
        }
    }

    pub fn try_clear(&self) -> Result<(), DbError> {
        self.backend.remove(&self.key)
    }

    /// Pretty-printed JSON of `load()`. Falls back to `[]`.
    pub fn export(&self) -> String {
        serde_json::to_string_pretty(&self.load()).unwrap_or_else(|e| {
            error!(error = %e, "failed to export message history");
            "[]".to_string()
        })
    }

    pub fn stats(&self) -> HistoryStats {
        filter::stats(&self.load())
    }

    pub fn search_and_filter(&self, term: &str, platform_filter: &str) -> Vec<HistoryRecord> {
        filter::search_and_filter(&self.load(), term, platform_filter)
    }

    fn read_records(&self) -> Result<Vec<HistoryRecord>, DbError> {
        let Some(raw) = self.backend.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let mut records: Vec<HistoryRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "stored history is not valid JSON, treating as empty");
                return Ok(Vec::new());
            }
        };
        // Persisted order is not trusted.
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    fn write_records(&self, records: &[HistoryRecord]) -> Result<(), DbError> {
        let json = serde_json::to_string(records)?;
        self.backend.set(&self.key, &json)
    }
}
