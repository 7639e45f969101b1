//! Offline analysis of a batch file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use statwatch_collector::BatchStore;
use tracing::debug;

use crate::report::render_report;

/// Read every snapshot in the batch file at `path` and write the report to `out`.
///
/// `span` is the window span in seconds; unset or negative means 60.
///
/// # Example
///
/// ```rust
/// use statwatch_collector::BatchStore;
/// use statwatch_types::{Snapshot, SourceKey};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = BatchStore::new(dir.path());
/// let path = store
///     .flush(&SourceKey::standalone("db1:27017"), &[Snapshot::default(), Snapshot::default()])
///     .unwrap();
///
/// let mut report = Vec::new();
/// statwatch::analyze_file(&path, None, &mut report).unwrap();
/// assert!(String::from_utf8(report).unwrap().starts_with("--- Host: "));
/// ```
pub fn analyze_file<W: Write + ?Sized>(
    path: impl AsRef<Path>,
    span: Option<i64>,
    out: &mut W,
) -> Result<()> {
    let path = path.as_ref();
    let snapshots = BatchStore::read_all(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    debug!(path = %path.display(), count = snapshots.len(), "loaded snapshots");

    render_report(&snapshots, span, out).context("Failed to write report")?;
    out.flush().context("Failed to write report")
}
