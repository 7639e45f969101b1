//! Cumulative time values reported in microseconds.
//!
//! Operation latencies and lock hold times are cumulative counters measured in
//! microseconds. They are kept in that unit internally and only converted to
//! milliseconds for display.

use core::fmt;
use core::ops::Sub;

use serde::{Deserialize, Deserializer, Serialize};

use crate::lenient::Lenient;

/// A cumulative duration in microseconds.
///
/// Signed so that the difference of two readings across a restart is
/// representable instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Microseconds(pub i64);

impl Microseconds {
    /// Create from microseconds.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create from milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1000)
    }

    /// Get the value in microseconds.
    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// Get the value in milliseconds (truncated).
    pub const fn as_millis(&self) -> i64 {
        self.0 / 1000
    }

    /// Get the value in fractional milliseconds.
    pub fn as_millis_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl<'de> Deserialize<'de> for Microseconds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Lenient::deserialize(deserializer).map(|v| Self(v.0))
    }
}

impl Sub for Microseconds {
    type Output = Microseconds;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl From<i64> for Microseconds {
    fn from(micros: i64) -> Self {
        Self(micros)
    }
}

impl fmt::Display for Microseconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.as_millis_f64();
        if ms.abs() >= 1000.0 {
            write!(f, "{:.2}s", ms / 1000.0)
        } else {
            write!(f, "{:.1}ms", ms)
        }
    }
}
