//! Report rendering.
//!
//! A report is a host header followed by one table per metric family, in
//! the order of [`FAMILIES`]. Rendering holds no state between calls.

pub mod table;

use std::io::{self, Write};

use statwatch_types::Snapshot;

use crate::data::{reduce_windows, FAMILIES};

pub use table::{format_time, render_table};

/// Render the full report for `snapshots`.
///
/// Writes nothing for an empty sequence.
pub fn render_report<W: Write + ?Sized>(
    snapshots: &[Snapshot],
    span: Option<i64>,
    out: &mut W,
) -> io::Result<()> {
    let Some(first) = snapshots.first() else {
        return Ok(());
    };

    writeln!(out, "--- Host: {}, version: {} ---", first.host, first.version)?;
    for family in FAMILIES.iter() {
        let rows = reduce_windows(family, snapshots, span);
        writeln!(out)?;
        render_table(family, &rows, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn samples() -> Vec<Snapshot> {
        (0..4)
            .map(|i| {
                let mut s = Snapshot::new("db1:27017", Utc.timestamp_opt(1_700_000_000 + i * 10, 0).unwrap());
                s.version = "7.0.4".into();
                s.opcounters.query = i * 50;
                s
            })
            .collect()
    }

    #[test]
    fn header_then_tables_in_order() {
        let mut out = Vec::new();
        render_report(&samples(), None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("--- Host: db1:27017, version: 7.0.4 ---\n"));

        let positions: Vec<usize> = FAMILIES
            .iter()
            .map(|f| text.find(&format!("\n{}\n", f.title)).expect(f.title))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn empty_sequence_renders_nothing() {
        let mut out = Vec::new();
        render_report(&[], None, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn report_is_a_pure_function() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        render_report(&samples(), Some(20), &mut a).unwrap();
        render_report(&samples(), Some(20), &mut b).unwrap();
        assert_eq!(a, b);
    }
}
