// src/error.rs
// =============================================================================
// Typed errors for each layer of the sweep.
//
// - FetchError: one request against one candidate URL failed at the transport
//   level. Always contained inside the probe and turned into Outcome::Error.
// - ConfigError: the run configuration is unusable. Fatal at startup.
// - ScanError: the scheduler itself could not keep going.
// - ExportError: the output artifact could not be created or written.
//
// main.rs wraps all of these in anyhow::Error with extra context.
// =============================================================================

use thiserror::Error;

/// Transport-level failure of a single GET.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("could not decode response body: {0}")]
    Decode(String),
    #[error("could not build http session: {0}")]
    Session(String),
    #[error("probe aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Whether another attempt at the same request might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout | FetchError::Connect(_) | FetchError::Request(_)
        )
    }
}

// Sorts reqwest's error kinds into our own buckets.
// The order matters: a timed-out connect is reported as a timeout.
impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        let message = error.to_string();

        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_connect() {
            FetchError::Connect(message)
        } else if error.is_decode() || error.is_body() {
            FetchError::Decode(message)
        } else if error.is_builder() {
            FetchError::Session(message)
        } else {
            FetchError::Request(message)
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("start id {start} is past the end of the id space ({total})")]
    StartPastEnd { start: u64, total: u64 },
    #[error("url template must contain the {{id}} placeholder exactly once: {0}")]
    Placeholder(String),
    #[error("url template does not form a valid http(s) url: {0}")]
    InvalidUrl(String),
    #[error("exclusion marker must not be empty")]
    EmptyMarker,
    #[error("a batch of {batch} ids is more than the worker queue can hold ({max})")]
    BatchTooLarge { batch: u64, max: u64 },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not construct http session: {0}")]
    Session(#[from] FetchError),
    #[error("worker pool stopped before the batch drained ({missing} completion(s) missing)")]
    PoolClosed { missing: u64 },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not write json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
}
