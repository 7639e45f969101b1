//! Once-a-minute live summary lines.
//!
//! At the 10-second cadence every 6th sample is one minute after the previous
//! summary, so the comparison point is simply the sample 6 positions back in
//! the source's ring. This is offset based, not time based.

use statwatch_types::{Snapshot, SourceKey};

/// Emit a summary on samples 1, 7, 13, ...
pub const SUMMARY_EVERY: u64 = 6;

/// Whether the sample with 1-based `ordinal` gets a summary.
pub fn is_summary_sample(ordinal: u64) -> bool {
    ordinal % SUMMARY_EVERY == 1
}

/// Build the summary lines for `current`, diffed against `earlier`.
///
/// Rates are only reported when `earlier` exists and `current` continues it.
/// A host change or counter reset is reported as a discontinuity instead.
pub fn live_summary(key: &SourceKey, current: &Snapshot, earlier: Option<&Snapshot>) -> Vec<String> {
    let memory = format!(
        "[{}] Memory - resident: {}, virtual: {}",
        key, current.mem.resident, current.mem.virtual_mb
    );

    let Some(earlier) = earlier else {
        return vec![memory];
    };

    if !current.continues(earlier) {
        let note = if current.host != earlier.host {
            format!(
                "[{}] Discontinuity - {} -> {}, rates restart",
                key, earlier.host, current.host
            )
        } else {
            format!("[{}] Discontinuity - {} restarted, rates restart", key, current.host)
        };
        return vec![memory, note];
    }

    let secs = current.elapsed_secs_since(earlier);
    let per_sec = |delta: i64| if secs > 0.0 { delta as f64 / secs } else { 0.0 };

    let faults = per_sec(current.extra_info.page_faults - earlier.extra_info.page_faults);
    let iops = per_sec(current.metrics.document.total() - earlier.metrics.document.total());

    let ops = &current.opcounters;
    let prev = &earlier.opcounters;
    let crud = format!(
        "[{}] CRUD+  - insert: {}, find: {}, update: {}, delete: {}, getmore: {}, command: {}",
        key,
        ops.insert - prev.insert,
        ops.query - prev.query,
        ops.update - prev.update,
        ops.delete - prev.delete,
        ops.getmore - prev.getmore,
        ops.command - prev.command,
    );

    let lat = &current.op_latencies;
    let prev_lat = &earlier.op_latencies;
    let latency = format!(
        "[{}] Latency- read: {:.1}, write: {:.1}, command: {:.1} (ms)",
        key,
        lat.reads.average_since(&prev_lat.reads).as_millis_f64(),
        lat.writes.average_since(&prev_lat.writes).as_millis_f64(),
        lat.commands.average_since(&prev_lat.commands).as_millis_f64(),
    );

    vec![
        format!("{}, page faults: {:.1}/s, iops: {:.1}", memory, faults, iops),
        crud,
        latency,
    ]
}
