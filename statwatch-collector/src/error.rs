//! Error types for collection and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`Connector`](crate::Connector) or [`Connection`](crate::Connection).
///
/// The collector treats all of them the same way: the cycle is skipped and
/// retried at the next cadence.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Could not reach or authenticate against the target.
    #[error("connection unavailable: {0}")]
    Unavailable(String),

    /// The diagnostic command itself failed.
    #[error("diagnostic command failed: {0}")]
    Command(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,
}

/// Errors raised by the [`BatchStore`](crate::BatchStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The batch file holds no decodable record.
    #[error("no snapshots found in {}", path.display())]
    NoData { path: PathBuf },

    /// The batch file could not be opened, created or written.
    #[error("batch file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot list could not be encoded.
    #[error("failed to encode snapshots: {0}")]
    Encode(#[from] serde_json::Error),

    /// The background flush task panicked or was cancelled.
    #[error("flush task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by one-shot collector operations.
///
/// The continuous loop never returns these; it records a skipped cycle instead.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Connection(#[from] ConnectError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
