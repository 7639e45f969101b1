//! # statwatch-collector
//!
//! Periodic collection of database diagnostic snapshots.
//!
//! A [`Collector`] samples each monitored source on a fixed cadence through a
//! [`Connector`] supplied by the embedding application. Every sample lands in
//! a bounded per-source ring for live display and in a pending buffer that is
//! flushed to a compressed, append-only batch file by the [`BatchStore`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use statwatch_collector::{
//!     BatchStore, Collector, ConnectError, Connection, Connector, StatusSink, Target,
//! };
//! use statwatch_types::SourceKey;
//!
//! #[derive(Debug)]
//! struct MyDriver;
//!
//! #[async_trait]
//! impl Connector for MyDriver {
//!     async fn acquire(&self, target: &Target) -> Result<Box<dyn Connection>, ConnectError> {
//!         // Hand out a connection from your database driver here
//!         Err(ConnectError::Unavailable(target.uri.clone()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (status, mut messages) = StatusSink::channel();
//!     let collector = Collector::builder(MyDriver)
//!         .store(BatchStore::in_temp_dir())
//!         .status(status)
//!         .live_summary(true)
//!         .build();
//!
//!     let key = SourceKey::new(Some("rs0"), ["db1:27017", "db2:27017"]);
//!     let handle = collector.start(Target::new(key, "mongodb://db1:27017,db2:27017"));
//!
//!     tokio::spawn(async move {
//!         while let Some(line) = messages.recv().await {
//!             println!("{line}");
//!         }
//!     });
//!
//!     tokio::time::sleep(Duration::from_secs(120)).await;
//!     handle.stop_and_wait().await.unwrap();
//! }
//! ```
//!
//! ## Features
//!
//! - **Isolated sources**: each source has its own ring, pending buffer and lock
//! - **Never dies on a bad cycle**: unreachable targets skip, bad documents record zeroes
//! - **Append-only batches**: one gzip member per flush, readable as one stream
//! - **Live summaries**: once-a-minute deltas with host-change detection

mod collector;
mod connection;
mod error;
mod handle;
mod ring;
mod state;
mod status;
mod store;
mod summary;

pub use collector::{
    CollectionHandle, CollectionStats, Collector, CollectorBuilder, CycleOutcome, SkipReason,
    StorageRate, DEFAULT_INTERVAL, DEFAULT_REQUEST_TIMEOUT, OBSERVE_ITERATIONS,
};
pub use connection::{Connection, Connector, RawDocument, Target};
pub use error::{CollectError, ConnectError, StoreError};
pub use handle::SourceHandle;
pub use ring::{RingBuffer, RING_CAPACITY};
pub use state::{Recorded, SourceRegistry, SourceState, FLUSH_THRESHOLD};
pub use status::StatusSink;
pub use store::{encode_record, BatchStore, FILE_PREFIX};
pub use summary::{is_summary_sample, live_summary, SUMMARY_EVERY};

// Re-export types for convenience
pub use statwatch_types::{Snapshot, SourceKey};
