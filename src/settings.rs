//! Settings for the reporter and for collectors built from them.
//!
//! Settings are layered from built-in defaults, an optional TOML file, and
//! `STATWATCH_*` environment variables, later layers winning:
//!
//! ```toml
//! span = 120
//! interval = "10s"
//! request_timeout = "30s"
//! batch_dir = "/var/tmp/statwatch"
//! live_summary = true
//! verbose = false
//! ```
//!
//! Durations accept a number of seconds or a string with a unit suffix
//! (`"500ms"`, `"2.5s"`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use statwatch_collector::{BatchStore, CollectorBuilder};

use crate::data::DEFAULT_SPAN_SECS;

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window span in seconds.
    pub span: i64,
    #[serde(deserialize_with = "duration")]
    pub interval: Duration,
    #[serde(deserialize_with = "duration")]
    pub request_timeout: Duration,
    /// Where batch files go. The system temp directory when unset.
    pub batch_dir: Option<PathBuf>,
    pub live_summary: bool,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            span: DEFAULT_SPAN_SECS,
            interval: statwatch_collector::DEFAULT_INTERVAL,
            request_timeout: statwatch_collector::DEFAULT_REQUEST_TIMEOUT,
            batch_dir: None,
            live_summary: false,
            verbose: false,
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let config = builder
            .add_source(Environment::with_prefix("STATWATCH"))
            .build()
            .context("Failed to load settings")?;
        config
            .try_deserialize()
            .context("Invalid settings")
    }

    /// The batch store these settings point at.
    pub fn store(&self) -> BatchStore {
        match &self.batch_dir {
            Some(dir) => BatchStore::new(dir),
            None => BatchStore::in_temp_dir(),
        }
    }

    /// Apply these settings to a collector builder.
    pub fn apply(&self, builder: CollectorBuilder) -> CollectorBuilder {
        builder
            .interval(self.interval)
            .request_timeout(self.request_timeout)
            .live_summary(self.live_summary)
            .verbose(self.verbose)
            .store(self.store())
    }
}

/// Parse duration strings like "29.99s", "988.82ms", "16.958µs", "0ns"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration out of range: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
