//! # statwatch-types
//!
//! Core types for database diagnostic telemetry. This crate defines the typed
//! model of one diagnostic sample (a [`Snapshot`]) and the identity of the
//! source it was taken from, shared by the collector and the report tooling.
//!
//! ## Design Goals
//!
//! - **Missing fields never abort decoding**: every field defaults to zero
//! - **Lenient numbers**: integers, floats, numeric strings and extended-JSON
//!   wrappers (`{"$numberLong": "42"}`) all decode into the same counters
//! - **Stable key names**: serialized snapshots keep the diagnostic document's
//!   key names, so stored batches stay readable by other tools
//!
//! ## Example
//!
//! ```rust
//! use statwatch_types::Snapshot;
//!
//! let raw = br#"{
//!     "host": "db1:27017",
//!     "version": "7.0.4",
//!     "localTime": "2024-03-01T10:00:00Z",
//!     "opcounters": { "insert": 120, "query": { "$numberLong": "4000" } }
//! }"#;
//!
//! let snapshot = Snapshot::decode(raw).unwrap();
//! assert_eq!(snapshot.host, "db1:27017");
//! assert_eq!(snapshot.opcounters.query, 4000);
//! assert_eq!(snapshot.mem.resident, 0);
//! ```

mod duration;
mod lenient;
mod metrics;
mod snapshot;
mod source;

pub use duration::*;
pub use metrics::*;
pub use snapshot::*;
pub use source::*;
