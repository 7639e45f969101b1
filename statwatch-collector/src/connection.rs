//! The seam to the database client.
//!
//! Establishing a secured, authenticated connection is the job of whatever
//! driver the embedding application uses. The collector only needs something
//! that can be acquired for a [`Target`], asked for documents, and released.

use std::fmt::Debug;

use async_trait::async_trait;
use statwatch_types::SourceKey;

use crate::ConnectError;

/// A raw diagnostic document as returned by the database, JSON encoded.
pub type RawDocument = Vec<u8>;

/// A monitored target: the source key plus whatever the connector needs to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Stable identity used for buffers and batch files.
    pub key: SourceKey,
    /// Connection string handed to the connector untouched.
    pub uri: String,
}

impl Target {
    /// Create a target for `uri` identified by `key`.
    pub fn new(key: SourceKey, uri: impl Into<String>) -> Self {
        Self {
            key,
            uri: uri.into(),
        }
    }
}

/// Produces connections to targets.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use statwatch_collector::{ConnectError, Connection, Connector, RawDocument, Target};
///
/// #[derive(Debug)]
/// struct Offline;
///
/// #[async_trait]
/// impl Connector for Offline {
///     async fn acquire(&self, target: &Target) -> Result<Box<dyn Connection>, ConnectError> {
///         Err(ConnectError::Unavailable(format!("{} is offline", target.uri)))
///     }
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    /// Open (or check out) a connection to `target`.
    async fn acquire(&self, target: &Target) -> Result<Box<dyn Connection>, ConnectError>;
}

/// An acquired connection.
#[async_trait]
pub trait Connection: Send {
    /// Run the server-status diagnostic command.
    async fn server_status(&mut self) -> Result<RawDocument, ConnectError>;

    /// Run the storage-statistics command against database `db`.
    async fn db_stats(&mut self, db: &str) -> Result<RawDocument, ConnectError>;

    /// Return the connection. The default simply drops it.
    fn release(self: Box<Self>) {}
}
