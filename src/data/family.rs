//! Metric family catalogues.
//!
//! A family is a named table of columns. Each column knows how to pull its
//! number out of a [`Snapshot`] and how to reduce a window of snapshots to a
//! single [`Value`].

use std::fmt;

use statwatch_types::{LatencyStats, Snapshot};

/// How a family's windows are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyKind {
    /// Counter families. The second sample always closes the first window.
    Delta,
    /// Gauge families. Samples accumulate until the span elapses or the
    /// sequence ends.
    Averaged,
}

impl FamilyKind {
    /// Whether the second sample of a sequence closes a window on its own.
    pub fn closes_on_second(self) -> bool {
        matches!(self, FamilyKind::Delta)
    }
}

/// How a column reduces one window, with the extractor it reads.
#[derive(Clone, Copy)]
pub enum Reduction {
    /// `(end - start) / elapsed seconds`. Zero when no time elapsed.
    Rate(fn(&Snapshot) -> i64),
    /// Integer mean over the window's member samples.
    Mean(fn(&Snapshot) -> i64),
    /// `end - start`, not divided by anything.
    Difference(fn(&Snapshot) -> i64),
    /// Average latency per operation between start and end.
    PerOp(fn(&Snapshot) -> &LatencyStats),
}

/// Unit a column's raw numbers are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Plain,
    /// Microseconds, rendered as milliseconds.
    Micros,
}

/// One reduced cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:.1}", v),
        }
    }
}

/// One column of a family table.
#[derive(Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub unit: Unit,
    pub reduction: Reduction,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

impl Column {
    const fn plain(name: &'static str, reduction: Reduction) -> Self {
        Self {
            name,
            unit: Unit::Plain,
            reduction,
        }
    }

    const fn micros(name: &'static str, reduction: Reduction) -> Self {
        Self {
            name,
            unit: Unit::Micros,
            reduction,
        }
    }

    /// Reduce the window running from `start` to `end`.
    ///
    /// `members` are the samples contributing to averages; it always ends
    /// with `end`.
    pub fn reduce(&self, start: &Snapshot, end: &Snapshot, members: &[Snapshot]) -> Value {
        match self.reduction {
            Reduction::Rate(extract) => {
                let secs = end.elapsed_secs_since(start);
                if secs <= 0.0 {
                    return Value::Float(0.0);
                }
                let rate = (extract(end) - extract(start)) as f64 / secs;
                Value::Float(self.scale(rate))
            }
            Reduction::Mean(extract) => {
                if members.is_empty() {
                    return Value::Int(self.scale_int(extract(end)));
                }
                let sum: i64 = members.iter().map(extract).sum();
                Value::Int(self.scale_int(sum / members.len() as i64))
            }
            Reduction::Difference(extract) => {
                Value::Int(self.scale_int(extract(end) - extract(start)))
            }
            Reduction::PerOp(extract) => {
                let average = extract(end).average_since(extract(start));
                Value::Float(average.as_millis_f64())
            }
        }
    }

    fn scale(&self, v: f64) -> f64 {
        match self.unit {
            Unit::Plain => v,
            Unit::Micros => v / 1000.0,
        }
    }

    fn scale_int(&self, v: i64) -> i64 {
        match self.unit {
            Unit::Plain => v,
            Unit::Micros => v / 1000,
        }
    }
}

/// A named table of columns reduced with one closing policy.
#[derive(Debug)]
pub struct Family {
    pub title: &'static str,
    pub kind: FamilyKind,
    pub columns: &'static [Column],
}

impl Family {
    /// Reduce every column over one window.
    pub fn reduce(&self, start: &Snapshot, end: &Snapshot, members: &[Snapshot]) -> Vec<Value> {
        self.columns
            .iter()
            .map(|c| c.reduce(start, end, members))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

pub static SUMMARY: Family = Family {
    title: "Summary",
    kind: FamilyKind::Delta,
    columns: &[
        Column::plain("res", Reduction::Mean(|s| s.mem.resident)),
        Column::plain("virt", Reduction::Mean(|s| s.mem.virtual_mb)),
        Column::plain("fault", Reduction::Rate(|s| s.extra_info.page_faults)),
        Column::plain("command", Reduction::Rate(|s| s.opcounters.command)),
        Column::plain("delete", Reduction::Rate(|s| s.opcounters.delete)),
        Column::plain("getmore", Reduction::Rate(|s| s.opcounters.getmore)),
        Column::plain("insert", Reduction::Rate(|s| s.opcounters.insert)),
        Column::plain("query", Reduction::Rate(|s| s.opcounters.query)),
        Column::plain("update", Reduction::Rate(|s| s.opcounters.update)),
        Column::plain("iops", Reduction::Rate(|s| s.opcounters.total())),
    ],
};

pub static GLOBAL_LOCK: Family = Family {
    title: "Global Lock",
    kind: FamilyKind::Averaged,
    columns: &[
        Column::micros(
            "totalTime(ms)",
            Reduction::Difference(|s| s.global_lock.total_time.as_micros()),
        ),
        Column::plain("ac-total", Reduction::Mean(|s| s.global_lock.active_clients.total)),
        Column::plain("ac-readers", Reduction::Mean(|s| s.global_lock.active_clients.readers)),
        Column::plain("ac-writers", Reduction::Mean(|s| s.global_lock.active_clients.writers)),
        Column::plain("cq-total", Reduction::Mean(|s| s.global_lock.current_queue.total)),
        Column::plain("cq-readers", Reduction::Mean(|s| s.global_lock.current_queue.readers)),
        Column::plain("cq-writers", Reduction::Mean(|s| s.global_lock.current_queue.writers)),
    ],
};

pub static LATENCY: Family = Family {
    title: "Latency",
    kind: FamilyKind::Delta,
    columns: &[
        Column::micros("reads(ms)", Reduction::PerOp(|s| &s.op_latencies.reads)),
        Column::micros("writes(ms)", Reduction::PerOp(|s| &s.op_latencies.writes)),
        Column::micros("commands(ms)", Reduction::PerOp(|s| &s.op_latencies.commands)),
    ],
};

pub static METRICS: Family = Family {
    title: "Metrics",
    kind: FamilyKind::Delta,
    columns: &[
        Column::plain("scanned", Reduction::Rate(|s| s.metrics.query_executor.scanned)),
        Column::plain(
            "scannedObj",
            Reduction::Rate(|s| s.metrics.query_executor.scanned_objects),
        ),
        Column::plain("scanAndOrder", Reduction::Rate(|s| s.metrics.operation.scan_and_order)),
        Column::plain("writeConflicts", Reduction::Rate(|s| s.metrics.operation.write_conflicts)),
        Column::plain("deleted", Reduction::Rate(|s| s.metrics.document.deleted)),
        Column::plain("inserted", Reduction::Rate(|s| s.metrics.document.inserted)),
        Column::plain("returned", Reduction::Rate(|s| s.metrics.document.returned)),
        Column::plain("updated", Reduction::Rate(|s| s.metrics.document.updated)),
    ],
};

pub static WIRED_TIGER_CACHE: Family = Family {
    title: "WiredTiger Cache",
    kind: FamilyKind::Averaged,
    columns: &[
        Column::plain("maxBytes", Reduction::Mean(|s| s.wired_tiger.cache.max_bytes_configured)),
        Column::plain("inCache", Reduction::Mean(|s| s.wired_tiger.cache.bytes_in_cache)),
        Column::plain("dirty", Reduction::Mean(|s| s.wired_tiger.cache.tracked_dirty_bytes)),
        Column::plain("modEvicted", Reduction::Mean(|s| s.wired_tiger.cache.modified_pages_evicted)),
        Column::plain(
            "unmodEvicted",
            Reduction::Mean(|s| s.wired_tiger.cache.unmodified_pages_evicted),
        ),
        Column::plain("pagesRead", Reduction::Mean(|s| s.wired_tiger.cache.pages_read_into_cache)),
        Column::plain(
            "pagesWritten",
            Reduction::Mean(|s| s.wired_tiger.cache.pages_written_from_cache),
        ),
    ],
};

pub static CONCURRENT_TRANSACTIONS: Family = Family {
    title: "Concurrent Transactions",
    kind: FamilyKind::Averaged,
    columns: &[
        Column::plain(
            "r-available",
            Reduction::Mean(|s| s.wired_tiger.concurrent_transactions.read.available),
        ),
        Column::plain("r-out", Reduction::Mean(|s| s.wired_tiger.concurrent_transactions.read.out)),
        Column::plain(
            "r-total",
            Reduction::Mean(|s| s.wired_tiger.concurrent_transactions.read.total_tickets),
        ),
        Column::plain(
            "w-available",
            Reduction::Mean(|s| s.wired_tiger.concurrent_transactions.write.available),
        ),
        Column::plain("w-out", Reduction::Mean(|s| s.wired_tiger.concurrent_transactions.write.out)),
        Column::plain(
            "w-total",
            Reduction::Mean(|s| s.wired_tiger.concurrent_transactions.write.total_tickets),
        ),
    ],
};

/// Every family, in report order.
pub static FAMILIES: [&Family; 6] = [
    &SUMMARY,
    &GLOBAL_LOCK,
    &LATENCY,
    &METRICS,
    &WIRED_TIGER_CACHE,
    &CONCURRENT_TRANSACTIONS,
];
