//! Fixed-capacity sliding window of recent snapshots for live display.

use std::collections::VecDeque;

use statwatch_types::Snapshot;

/// Maximum number of snapshots kept per source.
pub const RING_CAPACITY: usize = 60;

/// Strict FIFO window over the most recent snapshots of one source.
///
/// Eviction is silent: the ring bounds memory for live charts and summaries,
/// it is not a durability mechanism.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuffer {
    /// Create an empty ring with [`RING_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(RING_CAPACITY)
    }

    /// Create an empty ring holding at most `capacity` snapshots.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest once over capacity.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Current contents, oldest first.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.entries.iter().cloned().collect()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    /// The snapshot `offset` positions before the most recent one.
    ///
    /// `back(0)` is the latest entry.
    pub fn back(&self, offset: usize) -> Option<&Snapshot> {
        let index = self.entries.len().checked_sub(offset + 1)?;
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snap(n: i64) -> Snapshot {
        let mut s = Snapshot::new("db:1", Utc.timestamp_opt(n, 0).unwrap());
        s.opcounters.insert = n;
        s
    }

    #[test]
    fn new_ring_is_empty() {
        let ring = RingBuffer::new();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), RING_CAPACITY);
        assert!(ring.latest().is_none());
    }

    #[test]
    fn push_keeps_insertion_order() {
        let mut ring = RingBuffer::new();
        for i in 0..5 {
            ring.push(snap(i));
        }
        let inserts: Vec<i64> = ring.snapshots().iter().map(|s| s.opcounters.insert).collect();
        assert_eq!(inserts, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn ring_caps_at_capacity() {
        let mut ring = RingBuffer::new();
        for i in 0..70 {
            ring.push(snap(i));
        }
        assert_eq!(ring.len(), 60);
        assert_eq!(ring.snapshots()[0].opcounters.insert, 10);
        assert_eq!(ring.latest().unwrap().opcounters.insert, 69);
    }

    #[test]
    fn sixty_first_push_evicts_exactly_the_oldest() {
        let mut ring = RingBuffer::new();
        for i in 0..60 {
            ring.push(snap(i));
        }
        assert_eq!(ring.len(), 60);

        ring.push(snap(60));
        let contents = ring.snapshots();
        assert_eq!(contents.len(), 60);
        assert_eq!(contents[0].opcounters.insert, 1);
        assert_eq!(contents[59].opcounters.insert, 60);
    }

    #[test]
    fn back_indexes_from_the_latest() {
        let mut ring = RingBuffer::new();
        for i in 0..7 {
            ring.push(snap(i));
        }
        assert_eq!(ring.back(0).unwrap().opcounters.insert, 6);
        assert_eq!(ring.back(6).unwrap().opcounters.insert, 0);
        assert!(ring.back(7).is_none());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut ring = RingBuffer::with_capacity(0);
        ring.push(snap(1));
        ring.push(snap(2));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.latest().unwrap().opcounters.insert, 2);
    }
}
