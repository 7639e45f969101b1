//! Window reduction of collected snapshots.
//!
//! This module turns an ordered snapshot sequence into per-family rows of
//! reduced values, ready for the reporter.
//!
//! ## Submodules
//!
//! - [`family`]: Static column catalogues ([`Family`], [`Column`], [`Reduction`])
//! - [`window`]: The windowing scan ([`reduce_windows`], [`WindowRow`])
//!
//! ## Data Flow
//!
//! ```text
//! Vec<Snapshot> (from BatchStore::read_all)
//!        │
//!        ▼
//! reduce_windows(family, snapshots, span)
//!        │
//!        ├──▶ host boundary     → WindowRow { values: None }
//!        │
//!        └──▶ window closed     → Family::reduce() → WindowRow { values: Some(..) }
//! ```

pub mod family;
pub mod window;

pub use family::{
    Column, Family, FamilyKind, Reduction, Unit, Value, CONCURRENT_TRANSACTIONS, FAMILIES,
    GLOBAL_LOCK, LATENCY, METRICS, SUMMARY, WIRED_TIGER_CACHE,
};
pub use window::{effective_span, reduce_windows, WindowRow, DEFAULT_SPAN_SECS};
