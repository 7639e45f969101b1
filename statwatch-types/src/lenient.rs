//! Forgiving deserializers for diagnostic documents.
//!
//! Diagnostic documents arrive from different drivers and exporters, so the
//! same counter may be a JSON integer, a float, a numeric string or an
//! extended-JSON wrapper. Anything unrecognised decodes to zero.

use core::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};

/// An integer decoded from any of the accepted numeric shapes.
pub(crate) struct Lenient(pub i64);

impl<'de> Deserialize<'de> for Lenient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IntVisitor).map(Lenient)
    }
}

/// `deserialize_with` entry point for integer fields.
pub(crate) fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Lenient::deserialize(deserializer).map(|v| v.0)
}

struct IntVisitor;

impl<'de> Visitor<'de> for IntVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer, float, numeric string or extended-JSON number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        Ok(i64::try_from(v).unwrap_or(i64::MAX))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        // `as` saturates and maps NaN to zero
        Ok(v as i64)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<i64, E> {
        Ok(i64::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        let v = v.trim();
        if let Ok(n) = v.parse::<i64>() {
            return Ok(n);
        }
        v.parse::<f64>()
            .map(|f| f as i64)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
        Ok(0)
    }

    fn visit_none<E: de::Error>(self) -> Result<i64, E> {
        Ok(0)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<i64, A::Error> {
        let mut value = 0;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "$numberLong" | "$numberInt" | "$numberDouble" | "$numberDecimal" => {
                    value = map.next_value::<Lenient>()?.0;
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(value)
    }
}

/// A timestamp decoded from any of the accepted date shapes.
struct LenientTime(DateTime<Utc>);

impl<'de> Deserialize<'de> for LenientTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimeVisitor).map(LenientTime)
    }
}

/// `deserialize_with` entry point for timestamp fields.
pub(crate) fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    LenientTime::deserialize(deserializer).map(|t| t.0)
}

struct TimeVisitor;

impl TimeVisitor {
    fn from_millis<E: de::Error>(millis: i64) -> Result<DateTime<Utc>, E> {
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {millis}")))
    }
}

impl<'de> Visitor<'de> for TimeVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an RFC 3339 string, epoch milliseconds or an extended-JSON date")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DateTime<Utc>, E> {
        if let Ok(t) = DateTime::parse_from_rfc3339(v) {
            return Ok(t.with_timezone(&Utc));
        }
        match v.trim().parse::<i64>() {
            Ok(millis) => Self::from_millis(millis),
            Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DateTime<Utc>, E> {
        Self::from_millis(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DateTime<Utc>, E> {
        Self::from_millis(i64::try_from(v).unwrap_or(i64::MAX))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DateTime<Utc>, E> {
        Self::from_millis(v as i64)
    }

    fn visit_unit<E: de::Error>(self) -> Result<DateTime<Utc>, E> {
        Ok(DateTime::<Utc>::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<DateTime<Utc>, E> {
        Ok(DateTime::<Utc>::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DateTime<Utc>, A::Error> {
        let mut value = DateTime::<Utc>::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "$date" => value = map.next_value::<LenientTime>()?.0,
                "$numberLong" => value = Self::from_millis(map.next_value::<Lenient>()?.0)?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(value)
    }
}
