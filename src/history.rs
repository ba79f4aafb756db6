use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::{HistoryEntry, NormalizedWord};
use crate::store::KeyValueStore;

pub const HISTORY_KEY: &str = "searchHistory";
pub const HISTORY_CAPACITY: usize = 50;

/// Recent searches, newest first, one entry per word, at most
/// [`HISTORY_CAPACITY`] entries.
///
/// History is a convenience: storage failures are logged and never surface
/// to the caller. Reads of a missing or malformed record yield an empty
/// ledger.
pub struct HistoryLedger<S: KeyValueStore> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> HistoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn append(&self, word: &str) {
        self.append_at(word, Utc::now());
    }

    pub fn append_at(&self, word: &str, timestamp: DateTime<Utc>) {
        let Ok(word) = word.parse::<NormalizedWord>() else {
            return;
        };
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut entries = self.load();
        entries.retain(|entry| entry.word != word.as_str());
        entries.insert(0, HistoryEntry::new(word, timestamp));
        entries.truncate(HISTORY_CAPACITY);
        self.persist(&entries);
    }

    pub fn read_all(&self) -> Vec<HistoryEntry> {
        let mut entries = self.load();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    pub fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = self.store.remove(HISTORY_KEY) {
            tracing::warn!("failed to clear search history: {err}");
        }
    }

    fn load(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!("failed to read search history: {err}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!("discarding unreadable search history: {err}");
                Vec::new()
            }
        }
    }

    fn persist(&self, entries: &[HistoryEntry]) {
        let result = serde_json::to_string(entries)
            .map_err(|err| err.to_string())
            .and_then(|json| {
                self.store
                    .set(HISTORY_KEY, &json)
                    .map_err(|err| err.to_string())
            });
        if let Err(err) = result {
            tracing::warn!("failed to save search history: {err}");
        }
    }
}
