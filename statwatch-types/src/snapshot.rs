//! Snapshot - one point-in-time diagnostic sample of a database process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::{ExtraInfo, GlobalLock, MemStats, OpCounters, OpLatencies, ServerMetrics, WiredTiger};

/// A point-in-time diagnostic sample from one source.
///
/// Gauge fields (memory, lock queues, cache bytes, ticket pools) describe the
/// instant the sample was taken. Counter fields (operation counters,
/// latencies, document and executor counters, page faults) grow
/// monotonically for as long as the process on `host` stays up.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use statwatch_types::Snapshot;
///
/// let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
/// let mut first = Snapshot::new("db1:27017", t0);
/// first.opcounters.insert = 100;
///
/// let mut second = Snapshot::new("db1:27017", t0 + chrono::Duration::seconds(10));
/// second.opcounters.insert = 180;
///
/// assert!(second.continues(&first));
/// assert_eq!(second.elapsed_secs_since(&first), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Snapshot {
    /// Identity of the process that produced the sample (`host:port`).
    pub host: String,

    /// Server version string.
    pub version: String,

    /// Process name.
    pub process: String,

    /// Wall-clock time on the server when the sample was taken.
    #[serde(deserialize_with = "lenient::timestamp")]
    pub local_time: DateTime<Utc>,

    #[serde(alias = "Mem")]
    pub mem: MemStats,

    #[serde(rename = "extra_info")]
    pub extra_info: ExtraInfo,

    pub global_lock: GlobalLock,

    #[serde(rename = "opcounters")]
    pub opcounters: OpCounters,

    pub op_latencies: OpLatencies,

    pub metrics: ServerMetrics,

    pub wired_tiger: WiredTiger,
}

impl Snapshot {
    /// Create an otherwise empty snapshot for `host` taken at `local_time`.
    pub fn new(host: impl Into<String>, local_time: DateTime<Utc>) -> Self {
        Self {
            host: host.into(),
            local_time,
            ..Default::default()
        }
    }

    /// Decode a raw diagnostic document.
    ///
    /// Absent keys default to zero; only structurally invalid JSON or a value
    /// of an impossible shape is an error.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Decode a raw diagnostic document, falling back to a zeroed snapshot.
    ///
    /// The returned flag is `false` when decoding failed and the default was used.
    pub fn decode_or_default(bytes: &[u8]) -> (Self, bool) {
        match Self::decode(bytes) {
            Ok(snapshot) => (snapshot, true),
            Err(_) => (Self::default(), false),
        }
    }

    /// Seconds between `earlier` and this sample (negative if out of order).
    pub fn elapsed_secs_since(&self, earlier: &Snapshot) -> f64 {
        (self.local_time - earlier.local_time).num_milliseconds() as f64 / 1000.0
    }

    /// Whether this sample can be diffed against `previous`.
    ///
    /// Requires the same `host` and no monotonic counter going backwards. A
    /// decrease means the process restarted, so the pair straddles two
    /// process lifetimes.
    pub fn continues(&self, previous: &Snapshot) -> bool {
        if self.host != previous.host {
            return false;
        }
        let now = self.monotonic_counters();
        let before = previous.monotonic_counters();
        now.iter().zip(before.iter()).all(|(n, b)| n >= b)
    }

    fn monotonic_counters(&self) -> [i64; 14] {
        let ops = &self.opcounters;
        let lat = &self.op_latencies;
        let docs = &self.metrics.document;
        [
            self.extra_info.page_faults,
            ops.insert,
            ops.query,
            ops.update,
            ops.delete,
            ops.getmore,
            ops.command,
            lat.reads.ops,
            lat.writes.ops,
            lat.commands.ops,
            docs.deleted,
            docs.inserted,
            docs.returned,
            docs.updated,
        ]
    }
}
