//! Per-source buffers and the registry that owns them.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use statwatch_types::{Snapshot, SourceKey};

use crate::ring::RingBuffer;
use crate::{BatchStore, StoreError};

/// Pending snapshots above this count trigger a flush.
pub const FLUSH_THRESHOLD: usize = 12;

#[derive(Debug, Default)]
struct Buffers {
    ring: RingBuffer,
    pending: Vec<Snapshot>,
    samples: u64,
}

/// What recording one snapshot did to the source's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    /// 1-based ordinal of this sample since the source was registered.
    pub ordinal: u64,
    /// Snapshots waiting to be flushed, including this one.
    pub pending: usize,
}

impl Recorded {
    /// Whether the pending buffer has grown past [`FLUSH_THRESHOLD`].
    pub fn needs_flush(&self) -> bool {
        self.pending > FLUSH_THRESHOLD
    }
}

/// Live ring and pending-flush buffer of one source.
///
/// Ring and pending buffer share one lock so a push never tears between
/// them. Flushes are serialized by a second lock and do file I/O without
/// holding the buffer lock; only the flushed prefix is removed afterwards.
#[derive(Debug)]
pub struct SourceState {
    key: SourceKey,
    buffers: Mutex<Buffers>,
    flush_lock: Mutex<()>,
}

impl SourceState {
    pub fn new(key: SourceKey) -> Self {
        Self {
            key,
            buffers: Mutex::new(Buffers::default()),
            flush_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &SourceKey {
        &self.key
    }

    /// Append to both the ring (evicting past capacity) and the pending buffer.
    pub fn record(&self, snapshot: Snapshot) -> Recorded {
        let mut buffers = self.buffers.lock();
        buffers.pending.push(snapshot.clone());
        buffers.ring.push(snapshot);
        buffers.samples += 1;
        Recorded {
            ordinal: buffers.samples,
            pending: buffers.pending.len(),
        }
    }

    /// Ring contents, oldest first.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.buffers.lock().ring.snapshots()
    }

    /// The latest snapshot and the one `offset` positions before it.
    pub fn latest_and_back(&self, offset: usize) -> (Option<Snapshot>, Option<Snapshot>) {
        let buffers = self.buffers.lock();
        (
            buffers.ring.latest().cloned(),
            buffers.ring.back(offset).cloned(),
        )
    }

    pub fn pending_len(&self) -> usize {
        self.buffers.lock().pending.len()
    }

    pub fn sample_count(&self) -> u64 {
        self.buffers.lock().samples
    }

    /// Write the pending buffer to `store` and clear what was written.
    ///
    /// Returns `Ok(None)` when nothing was pending. On failure the pending
    /// buffer is left intact so the next trigger retries it.
    pub fn flush(&self, store: &BatchStore) -> Result<Option<PathBuf>, StoreError> {
        let _guard = self.flush_lock.lock();

        let batch = self.buffers.lock().pending.clone();
        if batch.is_empty() {
            return Ok(None);
        }

        let path = store.flush(&self.key, &batch)?;

        let mut buffers = self.buffers.lock();
        let flushed = batch.len().min(buffers.pending.len());
        buffers.pending.drain(..flushed);
        Ok(Some(path))
    }
}

/// Registry of monitored sources keyed by [`SourceKey`].
///
/// Lookups take a read lock only; each source's buffers sit behind their own
/// lock, so unrelated sources never contend on each other.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: RwLock<BTreeMap<SourceKey, Arc<SourceState>>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, or get the existing one.
    pub fn register(&self, key: &SourceKey) -> Arc<SourceState> {
        // Fast path
        {
            let sources = self.sources.read();
            if let Some(state) = sources.get(key) {
                return state.clone();
            }
        }

        // Slow path
        let mut sources = self.sources.write();
        sources
            .entry(key.clone())
            .or_insert_with(|| Arc::new(SourceState::new(key.clone())))
            .clone()
    }

    /// Look up a registered source.
    pub fn get(&self, key: &SourceKey) -> Option<Arc<SourceState>> {
        self.sources.read().get(key).cloned()
    }

    /// Remove a source. Returns `true` if it was registered.
    pub fn unregister(&self, key: &SourceKey) -> bool {
        self.sources.write().remove(key).is_some()
    }

    /// Keys of all registered sources.
    pub fn keys(&self) -> Vec<SourceKey> {
        self.sources.read().keys().cloned().collect()
    }

    /// Record a snapshot for `key`, registering the source if needed.
    pub fn push(&self, key: &SourceKey, snapshot: Snapshot) -> Recorded {
        self.register(key).record(snapshot)
    }

    /// Ring contents for `key`, oldest first. Empty for unknown sources.
    pub fn snapshots(&self, key: &SourceKey) -> Vec<Snapshot> {
        self.get(key).map(|s| s.snapshots()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snap(n: i64) -> Snapshot {
        let mut s = Snapshot::new("db1:27017", Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap());
        s.opcounters.insert = n;
        s
    }

    fn key(name: &str) -> SourceKey {
        SourceKey::new(Some(name), ["db1:27017"])
    }

    #[test]
    fn record_reports_ordinal_and_pending() {
        let state = SourceState::new(key("rs0"));
        let first = state.record(snap(1));
        let second = state.record(snap(2));
        assert_eq!(first, Recorded { ordinal: 1, pending: 1 });
        assert_eq!(second, Recorded { ordinal: 2, pending: 2 });
        assert!(!second.needs_flush());
    }

    #[test]
    fn thirteenth_record_needs_flush() {
        let state = SourceState::new(key("rs0"));
        let mut last = None;
        for i in 0..13 {
            last = Some(state.record(snap(i)));
        }
        assert!(last.unwrap().needs_flush());
    }

    #[test]
    fn flush_clears_pending_but_not_ring() {
        let dir = tempfile::tempdir().unwrap();
        let store = BatchStore::new(dir.path());
        let state = SourceState::new(key("rs0"));
        for i in 0..5 {
            state.record(snap(i));
        }

        let path = state.flush(&store).unwrap().unwrap();
        assert_eq!(state.pending_len(), 0);
        assert_eq!(state.snapshots().len(), 5);
        assert_eq!(BatchStore::read_all(path).unwrap().len(), 5);
    }

    #[test]
    fn flush_with_nothing_pending_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = BatchStore::new(dir.path());
        let state = SourceState::new(key("rs0"));
        assert!(state.flush(&store).unwrap().is_none());
        assert!(!store.path_for(state.key()).exists());
    }

    #[test]
    fn failed_flush_keeps_pending() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the store expects a directory
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let store = BatchStore::new(&blocker);

        let state = SourceState::new(key("rs0"));
        state.record(snap(1));
        state.record(snap(2));

        assert!(state.flush(&store).is_err());
        assert_eq!(state.pending_len(), 2);
    }

    #[test]
    fn latest_and_back() {
        let state = SourceState::new(key("rs0"));
        for i in 0..7 {
            state.record(snap(i));
        }
        let (latest, back) = state.latest_and_back(6);
        assert_eq!(latest.unwrap().opcounters.insert, 6);
        assert_eq!(back.unwrap().opcounters.insert, 0);
    }

    #[test]
    fn register_returns_same_arc_on_second_call() {
        let registry = SourceRegistry::new();
        let a = registry.register(&key("rs0"));
        let b = registry.register(&key("rs0"));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn push_and_snapshots_through_registry() {
        let registry = SourceRegistry::new();
        for i in 0..61 {
            registry.push(&key("rs0"), snap(i));
        }
        let contents = registry.snapshots(&key("rs0"));
        assert_eq!(contents.len(), 60);
        assert_eq!(contents[0].opcounters.insert, 1);
        assert!(registry.snapshots(&key("unknown")).is_empty());
    }

    #[test]
    fn unregister_drops_state() {
        let registry = SourceRegistry::new();
        registry.push(&key("rs0"), snap(1));
        assert!(registry.unregister(&key("rs0")));
        assert!(!registry.unregister(&key("rs0")));
        assert!(registry.get(&key("rs0")).is_none());
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn sources_are_isolated() {
        let registry = SourceRegistry::new();
        registry.push(&key("rs0"), snap(1));
        registry.push(&key("rs1"), snap(2));
        registry.push(&key("rs1"), snap(3));

        assert_eq!(registry.snapshots(&key("rs0")).len(), 1);
        assert_eq!(registry.snapshots(&key("rs1")).len(), 2);
        assert_eq!(registry.keys().len(), 2);
    }

    #[test]
    fn concurrent_pushes_to_different_sources() {
        use std::thread;

        let registry = Arc::new(SourceRegistry::new());
        let mut handles = vec![];
        for t in 0..8 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                let k = key(&format!("rs{t}"));
                for i in 0..100 {
                    registry.push(&k, snap(i));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        for t in 0..8 {
            let state = registry.get(&key(&format!("rs{t}"))).unwrap();
            assert_eq!(state.sample_count(), 100);
            assert_eq!(state.pending_len(), 100);
            assert_eq!(state.snapshots().len(), 60);
        }
    }

    #[test]
    fn concurrent_flushes_of_one_source_never_interleave() {
        use std::thread;

        let dir = tempfile::tempdir().unwrap();
        let store = BatchStore::new(dir.path());
        let state = Arc::new(SourceState::new(key("rs0")));

        let mut handles = vec![];
        for t in 0..4 {
            let state = state.clone();
            let store = store.clone();
            handles.push(thread::spawn(move || {
                let mut recorded = vec![];
                for i in 0..50 {
                    let value = t * 1_000 + i;
                    let ordinal = state.record(snap(value)).ordinal;
                    recorded.push((ordinal, value));
                    if i % 5 == 4 {
                        state.flush(&store).unwrap();
                    }
                }
                recorded
            }));
        }

        let mut recorded: Vec<(u64, i64)> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        state.flush(&store).unwrap();
        assert_eq!(state.pending_len(), 0);

        recorded.sort();
        let expected: Vec<i64> = recorded.into_iter().map(|(_, value)| value).collect();
        let written: Vec<i64> = BatchStore::read_all(store.path_for(state.key()))
            .unwrap()
            .iter()
            .map(|s| s.opcounters.insert)
            .collect();
        assert_eq!(written, expected);
    }
}
