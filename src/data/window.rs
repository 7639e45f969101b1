//! Window reduction over an ordered snapshot sequence.

use chrono::{DateTime, Utc};
use statwatch_types::Snapshot;

use super::family::{Family, Value};

/// Span used when none is configured, in seconds.
pub const DEFAULT_SPAN_SECS: i64 = 60;

/// One reduced window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRow {
    /// Timestamp of the sample that closed the window.
    pub at: DateTime<Utc>,
    /// Reduced values in column order, or `None` for a host boundary.
    pub values: Option<Vec<Value>>,
}

impl WindowRow {
    pub fn is_boundary(&self) -> bool {
        self.values.is_none()
    }
}

/// The span actually used for `span`: unset or negative falls back to 60s.
pub fn effective_span(span: Option<i64>) -> i64 {
    match span {
        Some(secs) if secs >= 0 => secs,
        _ => DEFAULT_SPAN_SECS,
    }
}

/// Partition `snapshots` into windows and reduce each one for `family`.
///
/// A single left-to-right scan keeps an anchor sample. A window closes when
/// the span has elapsed since the anchor or the sequence ends; delta
/// families also close one window at the second sample so short sequences
/// still report. The closing sample becomes the next anchor.
///
/// A sample that does not continue the one before it (different host, or a
/// counter went backwards) re-anchors without emitting, so no window ever
/// spans two hosts or two process lifetimes. Only when that happens at the
/// second sample is an explicit boundary row emitted, since nothing else
/// would be reported for it.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use statwatch::data::{reduce_windows, Value, SUMMARY};
/// use statwatch_types::Snapshot;
///
/// let start = Snapshot::new("db1:27017", Utc.timestamp_opt(1_700_000_000, 0).unwrap());
/// let mut end = Snapshot::new("db1:27017", Utc.timestamp_opt(1_700_000_050, 0).unwrap());
/// end.opcounters.insert = 100;
///
/// let rows = reduce_windows(&SUMMARY, &[start, end], None);
/// let insert = SUMMARY.column("insert").unwrap();
/// assert_eq!(rows[0].values.as_ref().unwrap()[insert], Value::Float(2.0));
/// ```
pub fn reduce_windows(family: &Family, snapshots: &[Snapshot], span: Option<i64>) -> Vec<WindowRow> {
    let span = effective_span(span) as f64;
    let last = match snapshots.len() {
        0 | 1 => return Vec::new(),
        n => n - 1,
    };

    let mut rows = Vec::new();
    let mut anchor = 0;
    let mut members_start = 0;

    for (i, sample) in snapshots.iter().enumerate().skip(1) {
        if !sample.continues(&snapshots[i - 1]) {
            if i == 1 {
                rows.push(WindowRow {
                    at: sample.local_time,
                    values: None,
                });
            }
            anchor = i;
            members_start = i;
            continue;
        }

        let start = &snapshots[anchor];
        let elapsed = sample.elapsed_secs_since(start);
        let closes = (i == 1 && family.kind.closes_on_second()) || elapsed >= span || i == last;
        if closes {
            rows.push(WindowRow {
                at: sample.local_time,
                values: Some(family.reduce(start, sample, &snapshots[members_start..=i])),
            });
            anchor = i;
            members_start = i + 1;
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::family::{GLOBAL_LOCK, LATENCY, SUMMARY, WIRED_TIGER_CACHE};
    use chrono::TimeZone;
    use statwatch_types::Microseconds;

    fn at(host: &str, secs: i64) -> Snapshot {
        Snapshot::new(host, Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    /// Ten-second cadence on one host with steadily growing inserts.
    fn steady(count: i64) -> Vec<Snapshot> {
        (0..count)
            .map(|i| {
                let mut s = at("db1:27017", i * 10);
                s.opcounters.insert = i * 100;
                s.global_lock.current_queue.total = i;
                s
            })
            .collect()
    }

    fn value(family: &Family, row: &WindowRow, column: &str) -> Value {
        row.values.as_ref().expect("not a boundary row")[family.column(column).unwrap()]
    }

    #[test]
    fn empty_and_single_sample_sequences_emit_nothing() {
        assert!(reduce_windows(&SUMMARY, &[], None).is_empty());
        assert!(reduce_windows(&SUMMARY, &steady(1), None).is_empty());
        assert!(reduce_windows(&GLOBAL_LOCK, &steady(1), None).is_empty());
    }

    #[test]
    fn two_samples_give_insert_rate() {
        let mut a = at("db1", 0);
        let mut b = at("db1", 50);
        a.opcounters.insert = 1_000;
        b.opcounters.insert = 1_100;

        let rows = reduce_windows(&SUMMARY, &[a, b], None);
        assert_eq!(rows.len(), 1);
        assert_eq!(value(&SUMMARY, &rows[0], "insert"), Value::Float(2.0));
        assert_eq!(rows[0].at, Utc.timestamp_opt(1_700_000_050, 0).unwrap());
    }

    #[test]
    fn zero_elapsed_rate_is_zero() {
        let a = at("db1", 0);
        let mut b = at("db1", 0);
        b.opcounters.insert = 100;

        let rows = reduce_windows(&SUMMARY, &[a, b], None);
        assert_eq!(value(&SUMMARY, &rows[0], "insert"), Value::Float(0.0));
    }

    #[test]
    fn lock_queue_average_over_forced_close() {
        let samples: Vec<Snapshot> = [4, 6, 8]
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let mut s = at("db1", i as i64 * 10);
                s.global_lock.current_queue.total = *q;
                s
            })
            .collect();

        let rows = reduce_windows(&GLOBAL_LOCK, &samples, None);
        assert_eq!(rows.len(), 1);
        assert_eq!(value(&GLOBAL_LOCK, &rows[0], "cq-total"), Value::Int(6));
    }

    #[test]
    fn host_change_at_second_sample_is_a_boundary_row() {
        let mut a = at("db1", 0);
        a.opcounters.insert = 500;
        let b = at("db2", 10);
        let mut c = at("db2", 20);
        c.opcounters.insert = 200;

        let rows = reduce_windows(&SUMMARY, &[a, b, c], None);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_boundary());
        assert_eq!(rows[0].at, Utc.timestamp_opt(1_700_000_010, 0).unwrap());
        // Anchored on the second sample, not the first host
        assert_eq!(value(&SUMMARY, &rows[1], "insert"), Value::Float(20.0));
    }

    #[test]
    fn later_host_change_reanchors_silently() {
        let mut samples = steady(4);
        for i in 4..8 {
            let mut s = at("db2:27017", i * 10);
            s.opcounters.insert = (i - 4) * 10;
            samples.push(s);
        }

        let rows = reduce_windows(&SUMMARY, &samples, None);
        assert!(rows.iter().all(|r| !r.is_boundary()));

        // Second sample, then the last sample of db2. The db1 tail (samples
        // 2 and 3) never reaches the span or the end of the sequence.
        assert_eq!(rows.len(), 2);
        assert_eq!(value(&SUMMARY, &rows[0], "insert"), Value::Float(10.0));
        // db2 from 40s (insert 0) to 70s (insert 30)
        assert_eq!(value(&SUMMARY, &rows[1], "insert"), Value::Float(1.0));
    }

    #[test]
    fn counter_reset_on_same_host_is_a_discontinuity() {
        let mut a = at("db1", 0);
        a.opcounters.insert = 10_000;
        let b = at("db1", 10);

        let rows = reduce_windows(&SUMMARY, &[a, b], None);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_boundary());
    }

    #[test]
    fn restart_inside_a_window_is_a_discontinuity() {
        // Counters climb past the anchor again before the restart is seen
        let samples: Vec<Snapshot> = [(0, 0), (100, 0), (1_000, 100), (500, 2)]
            .iter()
            .enumerate()
            .map(|(i, (inserts, queued))| {
                let mut s = at("db1", i as i64 * 10);
                s.opcounters.insert = *inserts;
                s.global_lock.current_queue.total = *queued;
                s
            })
            .collect();

        let rows = reduce_windows(&SUMMARY, &samples, None);
        assert_eq!(rows.len(), 1);
        assert_eq!(value(&SUMMARY, &rows[0], "insert"), Value::Float(10.0));

        // The open averaging window is dropped rather than mixed
        assert!(reduce_windows(&GLOBAL_LOCK, &samples, None).is_empty());
    }

    #[test]
    fn window_resumes_after_restart() {
        let mut samples = steady(3);
        for i in 3..6 {
            let mut s = at("db1:27017", i * 10);
            s.opcounters.insert = (i - 3) * 50;
            samples.push(s);
        }

        let rows = reduce_windows(&SUMMARY, &samples, None);
        assert_eq!(rows.len(), 2);
        // 30s (insert 0) to 50s (insert 100), after the restart
        assert_eq!(value(&SUMMARY, &rows[1], "insert"), Value::Float(5.0));
    }

    #[test]
    fn rates_are_never_negative_for_growing_counters() {
        let rows = reduce_windows(&SUMMARY, &steady(30), Some(30));
        assert!(!rows.is_empty());
        for row in &rows {
            match value(&SUMMARY, row, "insert") {
                Value::Float(rate) => assert!(rate >= 0.0),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn delta_family_windows() {
        // 13 samples at 10s: close at the second sample, after 60s, and at the end
        let rows = reduce_windows(&SUMMARY, &steady(13), None);
        let times: Vec<i64> = rows.iter().map(|r| r.at.timestamp() - 1_700_000_000).collect();
        assert_eq!(times, vec![10, 70, 120]);
        for row in &rows {
            assert_eq!(value(&SUMMARY, row, "insert"), Value::Float(10.0));
        }
    }

    #[test]
    fn averaged_family_windows() {
        let rows = reduce_windows(&GLOBAL_LOCK, &steady(13), None);
        let times: Vec<i64> = rows.iter().map(|r| r.at.timestamp() - 1_700_000_000).collect();
        assert_eq!(times, vec![60, 120]);
        // Seed plus samples 1..=6, then samples 7..=12
        assert_eq!(value(&GLOBAL_LOCK, &rows[0], "cq-total"), Value::Int(3));
        assert_eq!(value(&GLOBAL_LOCK, &rows[1], "cq-total"), Value::Int(9));
    }

    #[test]
    fn averages_only_include_one_host() {
        let mut samples = Vec::new();
        for i in 0..3 {
            let mut s = at("db1", i * 10);
            s.wired_tiger.cache.bytes_in_cache = 1_000_000;
            samples.push(s);
        }
        for i in 3..6 {
            let mut s = at("db2", i * 10);
            s.wired_tiger.cache.bytes_in_cache = 10;
            samples.push(s);
        }

        let rows = reduce_windows(&WIRED_TIGER_CACHE, &samples, None);
        assert_eq!(rows.len(), 1);
        assert_eq!(value(&WIRED_TIGER_CACHE, &rows[0], "inCache"), Value::Int(10));
    }

    #[test]
    fn span_is_configurable() {
        let rows = reduce_windows(&GLOBAL_LOCK, &steady(13), Some(30));
        let times: Vec<i64> = rows.iter().map(|r| r.at.timestamp() - 1_700_000_000).collect();
        assert_eq!(times, vec![30, 60, 90, 120]);
    }

    #[test]
    fn negative_span_falls_back_to_default() {
        assert_eq!(effective_span(None), DEFAULT_SPAN_SECS);
        assert_eq!(effective_span(Some(-5)), DEFAULT_SPAN_SECS);
        assert_eq!(effective_span(Some(0)), 0);
        assert_eq!(
            reduce_windows(&GLOBAL_LOCK, &steady(13), Some(-1)),
            reduce_windows(&GLOBAL_LOCK, &steady(13), None)
        );
    }

    #[test]
    fn latency_windows_report_millis_per_op() {
        let mut a = at("db1", 0);
        let mut b = at("db1", 10);
        a.op_latencies.reads.latency = Microseconds(5_000);
        a.op_latencies.reads.ops = 5;
        b.op_latencies.reads.latency = Microseconds(25_000);
        b.op_latencies.reads.ops = 15;

        let rows = reduce_windows(&LATENCY, &[a, b], None);
        assert_eq!(value(&LATENCY, &rows[0], "reads(ms)"), Value::Float(2.0));
    }
}
