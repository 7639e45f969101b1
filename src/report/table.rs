//! Fixed-width table rendering.

use std::io::{self, Write};

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::data::{Family, WindowRow};

/// Width of an RFC 3339 timestamp with a numeric offset.
const TIME_WIDTH: usize = 25;

/// Narrowest value column.
const MIN_CELL_WIDTH: usize = 8;

/// Cell shown for every column of a host-boundary row.
const BOUNDARY_CELL: &str = "-";

/// Render a window timestamp in the local timezone.
pub fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Render one family as a table: title, header, one row per window, closing rule.
pub fn render_table<W: Write + ?Sized>(
    family: &Family,
    rows: &[WindowRow],
    out: &mut W,
) -> io::Result<()> {
    let widths: Vec<usize> = family
        .columns
        .iter()
        .map(|c| c.name.len().max(MIN_CELL_WIDTH))
        .collect();
    let rule = rule(&widths);

    writeln!(out, "{}", family.title)?;
    writeln!(out, "{}", rule)?;

    let names: Vec<String> = family.columns.iter().map(|c| c.name.to_string()).collect();
    writeln!(out, "{}", line("Date/Time", &names, &widths))?;
    writeln!(out, "{}", rule)?;

    for row in rows {
        let cells: Vec<String> = match &row.values {
            Some(values) => values.iter().map(|v| v.to_string()).collect(),
            None => vec![BOUNDARY_CELL.to_string(); widths.len()],
        };
        writeln!(out, "{}", line(&format_time(row.at), &cells, &widths))?;
    }

    writeln!(out, "{}", rule)
}

fn rule(widths: &[usize]) -> String {
    let mut s = format!("+{}+", "-".repeat(TIME_WIDTH + 2));
    for w in widths {
        s.push_str(&"-".repeat(w + 2));
        s.push('+');
    }
    s
}

fn line(first: &str, cells: &[String], widths: &[usize]) -> String {
    let mut s = format!("| {:<width$} |", first, width = TIME_WIDTH);
    for (cell, w) in cells.iter().zip(widths) {
        s.push_str(&format!(" {:>width$} |", cell, width = *w));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Value, LATENCY};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn render(rows: &[WindowRow]) -> Vec<String> {
        let mut out = Vec::new();
        render_table(&LATENCY, rows, &mut out).unwrap();
        String::from_utf8(out).unwrap().lines().map(String::from).collect()
    }

    #[test]
    fn time_is_rfc3339_with_offset() {
        let s = format_time(at(0));
        assert_eq!(s.len(), TIME_WIDTH);
        assert_eq!(DateTime::parse_from_rfc3339(&s).unwrap(), at(0));
    }

    #[test]
    fn table_layout() {
        let rows = vec![WindowRow {
            at: at(10),
            values: Some(vec![Value::Float(1.5), Value::Float(0.0), Value::Float(12.3)]),
        }];
        let lines = render(&rows);

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Latency");
        assert_eq!(lines[1], lines[3]);
        assert_eq!(lines[1], lines[5]);
        assert!(lines[1].starts_with("+---"));
        assert!(lines[2].starts_with("| Date/Time "));
        assert!(lines[2].ends_with("| commands(ms) |"));
        assert!(lines[4].starts_with(&format!("| {} |", format_time(at(10)))));
        assert!(lines[4].contains(" 1.5 | "));
        assert!(lines[4].ends_with(" 12.3 |"));

        // Every line has the same width
        assert!(lines[1..].iter().all(|l| l.len() == lines[1].len()));
    }

    #[test]
    fn boundary_row_renders_dashes() {
        let rows = vec![WindowRow {
            at: at(10),
            values: None,
        }];
        let lines = render(&rows);
        let cells: Vec<&str> = lines[4].split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
        assert_eq!(&cells[1..], &["-", "-", "-"]);
    }

    #[test]
    fn no_rows_still_renders_header() {
        let lines = render(&[]);
        assert_eq!(lines.len(), 5);
    }
}
