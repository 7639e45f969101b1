//! Append-only, compressed persistence of accumulated snapshots.
//!
//! Each flush appends one independent gzip member holding a JSON array of
//! snapshots followed by a newline. Readers decompress the members as one
//! stream and decode it line by line, so any number of flushes read back as a
//! single ordered sequence.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use statwatch_types::{Snapshot, SourceKey};
use tracing::{debug, warn};

use crate::StoreError;

/// Prefix shared by every batch file.
pub const FILE_PREFIX: &str = "statwatch_stats";

/// Writes and reads per-source batch files.
///
/// File names are derived from a timestamp fixed when the store is created
/// and the source name, so every flush of one source during a process
/// lifetime lands in the same file. Only one writer per source is supported.
///
/// # Example
///
/// ```rust
/// use statwatch_collector::BatchStore;
/// use statwatch_types::{Snapshot, SourceKey};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = BatchStore::new(dir.path());
/// let key = SourceKey::new(Some("rs0"), ["db1:27017"]);
///
/// let path = store.flush(&key, &[Snapshot::default()]).unwrap();
/// let back = BatchStore::read_all(&path).unwrap();
/// assert_eq!(back.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct BatchStore {
    dir: PathBuf,
    stamp: String,
}

impl BatchStore {
    /// Create a store writing into `dir`, stamped with the current local time.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let stamp = Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        Self::with_stamp(dir, stamp)
    }

    /// Create a store writing into the system temporary directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Create a store with an explicit file-name stamp.
    pub fn with_stamp(dir: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stamp: stamp.into(),
        }
    }

    /// Directory batch files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Batch file used for `key`.
    pub fn path_for(&self, key: &SourceKey) -> PathBuf {
        let name: String = key
            .name()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.{}-{}.gz", FILE_PREFIX, self.stamp, name))
    }

    /// Append `snapshots` to the batch file of `key` as one compressed record.
    ///
    /// Creates the directory and file if needed. The caller clears its
    /// in-memory buffer only when this returns `Ok`.
    pub fn flush(&self, key: &SourceKey, snapshots: &[Snapshot]) -> Result<PathBuf, StoreError> {
        let record = encode_record(snapshots)?;
        let path = self.path_for(key);

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(&record).map_err(|e| StoreError::io(&path, e))?;
        file.sync_all().map_err(|e| StoreError::io(&path, e))?;

        debug!(
            source = %key,
            count = snapshots.len(),
            bytes = record.len(),
            path = %path.display(),
            "flushed snapshot batch"
        );
        Ok(path)
    }

    /// Read every record of a batch file, concatenated in file order.
    ///
    /// Records that fail to decode are skipped. A truncated or corrupt tail
    /// ends the read but keeps what was decoded before it. Fails with
    /// [`StoreError::NoData`] when nothing could be decoded.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Snapshot>, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let reader = BufReader::new(MultiGzDecoder::new(BufReader::new(file)));

        let mut snapshots = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(path = %path.display(), record = index, error = %e, "stopping at unreadable record");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Vec<Snapshot>>(&line) {
                Ok(mut batch) => snapshots.append(&mut batch),
                Err(e) => {
                    warn!(path = %path.display(), record = index, error = %e, "skipping undecodable record");
                }
            }
        }

        if snapshots.is_empty() {
            return Err(StoreError::NoData {
                path: path.to_path_buf(),
            });
        }
        Ok(snapshots)
    }
}

/// Encode one record: a gzip member wrapping a JSON array and a newline.
pub fn encode_record(snapshots: &[Snapshot]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, snapshots)?;
    encoder
        .write_all(b"\n")
        .map_err(|e| StoreError::io("<memory>", e))?;
    encoder.finish().map_err(|e| StoreError::io("<memory>", e))
}
