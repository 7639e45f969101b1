//! Read-side handle onto one monitored source.

use std::path::PathBuf;
use std::sync::Arc;

use statwatch_types::{Snapshot, SourceKey};

use crate::state::{Recorded, SourceState};
use crate::{BatchStore, StoreError};

/// A handle for inspecting the live buffers of one source.
///
/// Obtain one from [`Collector::source`](crate::Collector::source). Handles
/// are cheap to clone and stay valid after the source is unregistered; they
/// then keep reporting the last state the source had.
///
/// # Example
///
/// ```rust
/// use statwatch_collector::SourceRegistry;
/// use statwatch_collector::SourceHandle;
/// use statwatch_types::{Snapshot, SourceKey};
///
/// let registry = SourceRegistry::new();
/// let key = SourceKey::standalone("db1:27017");
/// registry.push(&key, Snapshot::default());
///
/// let handle = SourceHandle::new(registry.register(&key));
/// assert_eq!(handle.snapshots().len(), 1);
/// assert_eq!(handle.pending_len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SourceHandle {
    pub(crate) state: Arc<SourceState>,
}

impl SourceHandle {
    pub fn new(state: Arc<SourceState>) -> Self {
        Self { state }
    }

    /// The source this handle points at.
    pub fn key(&self) -> &SourceKey {
        self.state.key()
    }

    /// Record a snapshot into the ring and the pending buffer.
    pub fn record(&self, snapshot: Snapshot) -> Recorded {
        self.state.record(snapshot)
    }

    /// Flush pending snapshots to `store`. See [`SourceState::flush`].
    pub fn flush(&self, store: &BatchStore) -> Result<Option<PathBuf>, StoreError> {
        self.state.flush(store)
    }

    /// Recent snapshots for live display, oldest first.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.state.snapshots()
    }

    /// The most recent snapshot, if any.
    pub fn latest(&self) -> Option<Snapshot> {
        self.state.latest_and_back(0).0
    }

    /// Snapshots recorded but not yet flushed.
    pub fn pending_len(&self) -> usize {
        self.state.pending_len()
    }

    /// Total snapshots recorded since the source was registered.
    pub fn sample_count(&self) -> u64 {
        self.state.sample_count()
    }
}
