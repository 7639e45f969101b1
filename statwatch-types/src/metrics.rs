//! Metric sub-families of a diagnostic snapshot.
//!
//! Every struct here is `#[serde(default)]` and every integer goes through
//! the lenient decoder, so a partial or oddly-typed document still produces a
//! usable value with zeros for whatever was missing.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::Microseconds;

/// Resident and virtual memory in megabytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemStats {
    #[serde(deserialize_with = "lenient::int")]
    pub resident: i64,
    #[serde(rename = "virtual", deserialize_with = "lenient::int")]
    pub virtual_mb: i64,
}

/// Process-level counters outside the main sections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraInfo {
    #[serde(deserialize_with = "lenient::int")]
    pub page_faults: i64,
}

/// Reader/writer breakdown used for both active clients and queued lock requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LockCounts {
    #[serde(deserialize_with = "lenient::int")]
    pub total: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub readers: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub writers: i64,
}

/// Global lock section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalLock {
    /// Cumulative time the global lock has existed, in microseconds.
    pub total_time: Microseconds,
    pub current_queue: LockCounts,
    pub active_clients: LockCounts,
}

/// Operation counters since process start.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpCounters {
    #[serde(deserialize_with = "lenient::int")]
    pub insert: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub query: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub update: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub delete: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub getmore: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub command: i64,
}

impl OpCounters {
    /// Sum of all operation types.
    pub fn total(&self) -> i64 {
        [self.query, self.update, self.delete, self.getmore, self.command]
            .iter()
            .fold(self.insert, |sum, n| sum.saturating_add(*n))
    }
}

/// Cumulative latency and operation count for one class of operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyStats {
    pub latency: Microseconds,
    #[serde(deserialize_with = "lenient::int")]
    pub ops: i64,
}

impl LatencyStats {
    /// Average latency per operation between `earlier` and `self`.
    ///
    /// Zero when no operations completed in between.
    pub fn average_since(&self, earlier: &LatencyStats) -> Microseconds {
        let ops = self.ops.saturating_sub(earlier.ops);
        if ops <= 0 {
            return Microseconds::default();
        }
        Microseconds((self.latency - earlier.latency).as_micros() / ops)
    }
}

/// Per-class operation latencies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpLatencies {
    pub reads: LatencyStats,
    pub writes: LatencyStats,
    pub commands: LatencyStats,
}

/// Document-level counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentCounters {
    #[serde(deserialize_with = "lenient::int")]
    pub deleted: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub inserted: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub returned: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub updated: i64,
}

impl DocumentCounters {
    /// Sum of all document operations.
    pub fn total(&self) -> i64 {
        [self.inserted, self.returned, self.updated]
            .iter()
            .fold(self.deleted, |sum, n| sum.saturating_add(*n))
    }
}

/// Query executor counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryExecutor {
    #[serde(deserialize_with = "lenient::int")]
    pub scanned: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub scanned_objects: i64,
}

/// Counters for expensive operation outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationCounters {
    #[serde(deserialize_with = "lenient::int")]
    pub scan_and_order: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub write_conflicts: i64,
}

/// The `metrics` section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerMetrics {
    pub document: DocumentCounters,
    pub query_executor: QueryExecutor,
    pub operation: OperationCounters,
}

/// Storage engine cache gauges.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    #[serde(rename = "maximum bytes configured", deserialize_with = "lenient::int")]
    pub max_bytes_configured: i64,
    #[serde(rename = "bytes currently in the cache", deserialize_with = "lenient::int")]
    pub bytes_in_cache: i64,
    #[serde(rename = "tracked dirty bytes in the cache", deserialize_with = "lenient::int")]
    pub tracked_dirty_bytes: i64,
    #[serde(rename = "modified pages evicted", deserialize_with = "lenient::int")]
    pub modified_pages_evicted: i64,
    #[serde(rename = "unmodified pages evicted", deserialize_with = "lenient::int")]
    pub unmodified_pages_evicted: i64,
    #[serde(rename = "pages read into cache", deserialize_with = "lenient::int")]
    pub pages_read_into_cache: i64,
    #[serde(rename = "pages written from cache", deserialize_with = "lenient::int")]
    pub pages_written_from_cache: i64,
}

/// One concurrent-transaction ticket pool.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketPool {
    #[serde(deserialize_with = "lenient::int")]
    pub available: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub out: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub total_tickets: i64,
}

/// Read and write ticket pools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrentTransactions {
    pub read: TicketPool,
    pub write: TicketPool,
}

/// The storage engine section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WiredTiger {
    pub cache: CacheStats,
    pub concurrent_transactions: ConcurrentTransactions,
}

/// Per-database storage statistics, sampled by the bounded storage observation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DbStats {
    pub db: String,
    /// Logical size of all documents, in bytes.
    #[serde(deserialize_with = "lenient::int")]
    pub data_size: i64,
    /// Bytes allocated on disk. Growth rates are taken from `data_size`.
    #[serde(deserialize_with = "lenient::int")]
    pub storage_size: i64,
}

impl DbStats {
    /// Decode a storage statistics document; absent fields are zero.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_counter_total() {
        let ops = OpCounters {
            insert: 1,
            query: 2,
            update: 3,
            delete: 4,
            getmore: 5,
            command: 6,
        };
        assert_eq!(ops.total(), 21);
    }

    #[test]
    fn totals_saturate_on_clamped_counters() {
        let ops: OpCounters =
            serde_json::from_str(r#"{"insert": 18446744073709551615, "query": 3}"#).unwrap();
        assert_eq!(ops.insert, i64::MAX);
        assert_eq!(ops.total(), i64::MAX);

        let docs = DocumentCounters {
            deleted: 1,
            inserted: i64::MAX,
            ..Default::default()
        };
        assert_eq!(docs.total(), i64::MAX);
    }

    #[test]
    fn latency_average_since() {
        let earlier = LatencyStats {
            latency: Microseconds(1_000),
            ops: 10,
        };
        let later = LatencyStats {
            latency: Microseconds(31_000),
            ops: 20,
        };
        assert_eq!(later.average_since(&earlier), Microseconds(3_000));
    }

    #[test]
    fn latency_average_without_new_ops_is_zero() {
        let stats = LatencyStats {
            latency: Microseconds(5_000),
            ops: 10,
        };
        assert_eq!(stats.average_since(&stats), Microseconds(0));
    }

    #[test]
    fn cache_keys_use_document_names() {
        let cache: CacheStats = serde_json::from_str(
            r#"{"maximum bytes configured": 1024, "pages read into cache": 7.0}"#,
        )
        .unwrap();
        assert_eq!(cache.max_bytes_configured, 1024);
        assert_eq!(cache.pages_read_into_cache, 7);
        assert_eq!(cache.bytes_in_cache, 0);
    }

    #[test]
    fn db_stats_decode() {
        let stats = DbStats::decode(br#"{"db": "shop", "dataSize": 1048576.0}"#).unwrap();
        assert_eq!(stats.db, "shop");
        assert_eq!(stats.data_size, 1_048_576);
        assert_eq!(stats.storage_size, 0);
    }
}
