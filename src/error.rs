use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DictError {
    #[error("query is blank")]
    BlankQuery,

    #[error("invalid dataset url: {0}")]
    InvalidUrl(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("dataset transfer failed: {0}")]
    TransferFailed(String),

    #[error("dataset server returned status {status}: {message}")]
    TransferStatus { status: u16, message: String },

    #[error("dataset is not a valid dictionary database: {0}")]
    #[diagnostic(help("the downloaded file must be an SQLite database with a `words` table"))]
    DatasetCorrupt(String),

    #[error("search failed: {0}")]
    QueryFailed(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl DictError {
    /// Load-time failures end the session; everything else is recoverable.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            DictError::TransferFailed(_)
                | DictError::TransferStatus { .. }
                | DictError::DatasetCorrupt(_)
        )
    }
}
