use std::sync::Arc;
use std::time::Instant;

use crate::dataset::DatasetStore;
use crate::domain::{HistoryEntry, NormalizedWord, SearchResult, TransferState};
use crate::error::DictError;
use crate::history::HistoryLedger;
use crate::store::KeyValueStore;
use crate::transfer::DatasetClient;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Progress(TransferState),
    Ready { rows: u64, bytes: usize },
    Failed { message: String },
}

pub trait ProgressSink {
    fn event(&self, event: LoadEvent);
}

/// A lookup session: one dataset, loaded once, plus the shared history
/// ledger every executed search is recorded in.
pub struct App<C: DatasetClient, S: KeyValueStore> {
    client: C,
    history: Arc<HistoryLedger<S>>,
    dataset: Option<DatasetStore>,
}

impl<C: DatasetClient, S: KeyValueStore> App<C, S> {
    pub fn new(client: C, history: Arc<HistoryLedger<S>>) -> Self {
        Self {
            client,
            history,
            dataset: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn history(&self) -> &Arc<HistoryLedger<S>> {
        &self.history
    }

    /// Downloads and opens the dataset. A no-op once the session is ready;
    /// after a failure the session stays unloaded and the whole load may be
    /// retried.
    pub fn load(&mut self, sink: &dyn ProgressSink) -> Result<(), DictError> {
        if self.dataset.is_some() {
            return Ok(());
        }
        match self.fetch_and_open(sink) {
            Ok(dataset) => {
                let rows = dataset.row_count().unwrap_or_default();
                tracing::info!(rows, "dictionary ready");
                sink.event(LoadEvent::Ready {
                    rows,
                    bytes: dataset.size(),
                });
                self.dataset = Some(dataset);
                Ok(())
            }
            Err(err) => {
                sink.event(LoadEvent::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn fetch_and_open(&self, sink: &dyn ProgressSink) -> Result<DatasetStore, DictError> {
        let start = Instant::now();
        let source = self.client.open()?;
        let bytes = source
            .into_transfer()
            .run(|state| sink.event(LoadEvent::Progress(*state)))?;
        tracing::info!(
            source = %self.client.describe(),
            bytes = bytes.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "dataset downloaded"
        );
        DatasetStore::open(&bytes)
    }

    /// Exact-match lookup. Returns `Ok(None)` without touching history when
    /// the dataset is not loaded yet or the input is blank.
    pub fn search(&self, raw: &str) -> Result<Option<SearchResult>, DictError> {
        let Some(dataset) = self.dataset.as_ref() else {
            tracing::debug!("search ignored: dataset not loaded");
            return Ok(None);
        };
        let Ok(word) = raw.parse::<NormalizedWord>() else {
            return Ok(None);
        };

        let rows = dataset.query(&word)?;
        self.history.append(word.as_str());
        Ok(Some(SearchResult {
            title: raw.to_string(),
            rows,
        }))
    }

    /// Re-runs a search picked from the history list.
    pub fn rerun(&self, entry: &HistoryEntry) -> Result<Option<SearchResult>, DictError> {
        self.search(&entry.word)
    }

    pub fn close(self) -> Result<(), DictError> {
        match self.dataset {
            Some(dataset) => dataset.close(),
            None => Ok(()),
        }
    }
}
