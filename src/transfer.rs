use std::fs::File;
use std::io::{ErrorKind, Read};
use std::mem;
use std::thread;
use std::time::Duration;

use camino::Utf8PathBuf;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::TransferState;
use crate::error::DictError;

const CHUNK_SIZE: usize = 64 * 1024;
const MAX_PREALLOC: u64 = 256 * 1024 * 1024;
const UNKNOWN_TOTAL_CAP: f64 = 90.0;

/// An opened dataset body plus the length the source advertised, if any.
pub struct DatasetSource {
    pub total: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl DatasetSource {
    pub fn into_transfer(self) -> Transfer<Box<dyn Read + Send>> {
        Transfer::new(self.body, self.total)
    }
}

pub trait DatasetClient: Send + Sync {
    fn open(&self) -> Result<DatasetSource, DictError>;
    fn describe(&self) -> String;
}

#[derive(Debug)]
pub enum TransferEvent {
    Progress(TransferState),
    Complete { state: TransferState, bytes: Vec<u8> },
}

/// Pulls a dataset body chunk by chunk. Yields a progress snapshot per chunk
/// and ends with exactly one `Complete` or one error.
pub struct Transfer<R> {
    reader: R,
    state: TransferState,
    buffer: Vec<u8>,
    chunk: Box<[u8]>,
    finished: bool,
}

impl<R: Read> Transfer<R> {
    pub fn new(reader: R, total: Option<u64>) -> Self {
        let total = total.filter(|total| *total > 0);
        let capacity = total.map(|total| total.min(MAX_PREALLOC)).unwrap_or(0);
        Self {
            reader,
            state: TransferState::new(total),
            buffer: Vec::with_capacity(capacity as usize),
            chunk: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            finished: false,
        }
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Drives the transfer to the end, reporting every snapshot.
    pub fn run(self, mut on_progress: impl FnMut(&TransferState)) -> Result<Vec<u8>, DictError> {
        for event in self {
            match event? {
                TransferEvent::Progress(state) => on_progress(&state),
                TransferEvent::Complete { state, bytes } => {
                    on_progress(&state);
                    return Ok(bytes);
                }
            }
        }
        Err(DictError::TransferFailed("transfer ended without data".to_string()))
    }

    fn fail(&mut self, cause: String) -> Option<Result<TransferEvent, DictError>> {
        self.finished = true;
        self.buffer = Vec::new();
        tracing::warn!(loaded = self.state.bytes_loaded, "dataset transfer failed: {cause}");
        Some(Err(DictError::TransferFailed(cause)))
    }

    fn complete(&mut self) -> Option<Result<TransferEvent, DictError>> {
        if self.state.total_known() && self.state.bytes_loaded < self.state.bytes_total {
            let cause = format!(
                "body truncated: expected {} bytes, received {}",
                self.state.bytes_total, self.state.bytes_loaded
            );
            return self.fail(cause);
        }
        self.finished = true;
        self.state.percent = 100.0;
        tracing::debug!(bytes = self.state.bytes_loaded, "dataset transfer complete");
        Some(Ok(TransferEvent::Complete {
            state: self.state,
            bytes: mem::take(&mut self.buffer),
        }))
    }
}

impl<R: Read> Iterator for Transfer<R> {
    type Item = Result<TransferEvent, DictError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.reader.read(&mut self.chunk) {
                Ok(0) => return self.complete(),
                Ok(read) => {
                    self.buffer.extend_from_slice(&self.chunk[..read]);
                    self.state.bytes_loaded += read as u64;
                    let next = progress_percent(self.state.bytes_loaded, self.state.bytes_total);
                    self.state.percent = self.state.percent.max(next);
                    return Some(Ok(TransferEvent::Progress(self.state)));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return self.fail(err.to_string()),
            }
        }
    }
}

/// Percent for an in-flight transfer. Without a known total the value is a
/// rough estimate that never reaches 100 before completion.
pub fn progress_percent(loaded: u64, total: u64) -> f64 {
    if total > 0 {
        (loaded as f64 * 100.0 / total as f64).min(100.0)
    } else {
        (loaded as f64 * 10.0 / 1_000_000.0).min(UNKNOWN_TOTAL_CAP)
    }
}

#[derive(Clone)]
pub struct HttpDatasetClient {
    client: Client,
    url: Url,
}

impl HttpDatasetClient {
    pub fn new(url: Url, timeout: Option<Duration>) -> Result<Self, DictError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("offline-dict/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DictError::TransferFailed(err.to_string()))?,
        );
        // The blocking client defaults to a 30s timeout; a large dataset needs none.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| DictError::TransferFailed(err.to_string()))?;
        Ok(Self { client, url })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, DictError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .status()
            .canonical_reason()
            .unwrap_or("dataset request failed")
            .to_string();
        Err(DictError::TransferStatus { status, message })
    }

    fn send_with_retries(&self) -> Result<reqwest::blocking::Response, DictError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match self.client.get(self.url.clone()).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        tracing::debug!(status, attempt, "retrying dataset request");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        tracing::debug!(attempt, "retrying dataset request after {err}");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(DictError::TransferFailed(err.to_string()));
                }
            }
        }
    }
}

impl DatasetClient for HttpDatasetClient {
    fn open(&self) -> Result<DatasetSource, DictError> {
        tracing::info!(url = %self.url, "fetching dataset");
        let response = Self::handle_status(self.send_with_retries()?)?;
        Ok(DatasetSource {
            total: response.content_length(),
            body: Box::new(response),
        })
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Serves the dataset from a local file, for sessions without network access.
#[derive(Debug, Clone)]
pub struct FileDatasetClient {
    path: Utf8PathBuf,
}

impl FileDatasetClient {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetClient for FileDatasetClient {
    fn open(&self) -> Result<DatasetSource, DictError> {
        let file = File::open(self.path.as_std_path())
            .map_err(|err| DictError::TransferFailed(format!("open {}: {err}", self.path)))?;
        let total = file
            .metadata()
            .map_err(|err| DictError::TransferFailed(err.to_string()))?
            .len();
        Ok(DatasetSource {
            total: Some(total),
            body: Box::new(file),
        })
    }

    fn describe(&self) -> String {
        self.path.to_string()
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}
