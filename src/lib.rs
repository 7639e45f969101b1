//! # statwatch
//!
//! Windowed reports over collected database diagnostic snapshots.
//!
//! The collector crate samples a database every few seconds and appends the
//! snapshots to compressed batch files. This crate reads a batch file back,
//! cuts the sequence into time windows that never straddle a host change,
//! reduces each window per metric family, and renders fixed-width tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  batch file ──▶ BatchStore::read_all ──▶ Vec<Snapshot>       │
//! │                                              │               │
//! │                                              ▼               │
//! │               data::reduce_windows(family, snapshots, span)  │
//! │                                              │               │
//! │                                              ▼               │
//! │                report::render_report ──▶ text tables         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`data`]**: Metric family catalogues and the window reducer
//! - **[`report`]**: Fixed-width table rendering, one table per family
//! - **[`settings`]**: Layered settings shared by the reporter and collectors
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Report with one-minute windows
//! statwatch /tmp/statwatch_stats.2024-03-01T100000-rs0.gz
//!
//! # Five-minute windows
//! statwatch /tmp/statwatch_stats.2024-03-01T100000-rs0.gz --span 300
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! let mut stdout = std::io::stdout();
//! statwatch::analyze_file("/tmp/statwatch_stats.2024-03-01T100000-rs0.gz", Some(300), &mut stdout)
//!     .unwrap();
//! ```

pub mod analyze;
pub mod data;
pub mod report;
pub mod settings;

// Re-export main types for convenience
pub use analyze::analyze_file;
pub use data::{reduce_windows, Family, Value, WindowRow, FAMILIES};
pub use report::render_report;
pub use settings::Settings;
