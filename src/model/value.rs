//! Typed document values.
//!
//! `Value` is the storable tagged union: every field of a document and every
//! successful evaluation result is one of these kinds. Numbers keep their
//! integer/double representation; vectors are tagged apart from arrays.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::path::ResourcePath;

/// Map fields keyed by name. Keys are unique and iterate in byte order.
pub type MapValue = BTreeMap<String, Value>;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// A point in time with nanosecond precision.
///
/// Only instants between 0001-01-01T00:00:00Z and 9999-12-31T23:59:59.999999999Z
/// are representable. Constructors return `None` outside that range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp")]
pub struct Timestamp {
    seconds: i64,
    nanos: i32,
}

#[derive(Deserialize)]
struct RawTimestamp {
    seconds: i64,
    nanos: i32,
}

impl TryFrom<RawTimestamp> for Timestamp {
    type Error = String;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        Timestamp::new(raw.seconds, raw.nanos).ok_or_else(|| {
            format!(
                "timestamp out of range: seconds={}, nanos={}",
                raw.seconds, raw.nanos
            )
        })
    }
}

impl Timestamp {
    /// Seconds of 0001-01-01T00:00:00Z.
    pub const MIN_SECONDS: i64 = -62_135_596_800;
    /// Seconds of 9999-12-31T23:59:59Z.
    pub const MAX_SECONDS: i64 = 253_402_300_799;

    pub const MIN: Timestamp = Timestamp {
        seconds: Self::MIN_SECONDS,
        nanos: 0,
    };

    pub const MAX: Timestamp = Timestamp {
        seconds: Self::MAX_SECONDS,
        nanos: 999_999_999,
    };

    pub const EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Create a timestamp, validating range and nanosecond bounds.
    pub fn new(seconds: i64, nanos: i32) -> Option<Self> {
        if !(Self::MIN_SECONDS..=Self::MAX_SECONDS).contains(&seconds) {
            return None;
        }
        if !(0..=999_999_999).contains(&nanos) {
            return None;
        }
        Some(Self { seconds, nanos })
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    /// Nanoseconds since the Unix epoch.
    pub fn epoch_nanos(&self) -> i128 {
        self.seconds as i128 * NANOS_PER_SECOND + self.nanos as i128
    }

    /// Build a timestamp from nanoseconds since the Unix epoch.
    pub fn from_epoch_nanos(nanos: i128) -> Option<Self> {
        let seconds = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND)).ok()?;
        let nanos = nanos.rem_euclid(NANOS_PER_SECOND) as i32;
        Self::new(seconds, nanos)
    }

    pub fn from_unix_micros(micros: i64) -> Option<Self> {
        Self::from_epoch_nanos(micros as i128 * 1_000)
    }

    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        Self::from_epoch_nanos(millis as i128 * 1_000_000)
    }

    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        Self::new(seconds, 0)
    }

    /// Microseconds since the epoch, truncated toward negative infinity.
    pub fn to_unix_micros(&self) -> i64 {
        // Always fits: the representable range spans less than 2^63 micros.
        self.epoch_nanos().div_euclid(1_000) as i64
    }

    /// Milliseconds since the epoch, truncated toward negative infinity.
    pub fn to_unix_millis(&self) -> i64 {
        self.epoch_nanos().div_euclid(1_000_000) as i64
    }

    /// Whole seconds since the epoch, truncated toward negative infinity.
    pub fn to_unix_seconds(&self) -> i64 {
        self.seconds
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos as u32)
    }

    pub fn from_datetime(datetime: &DateTime<Utc>) -> Option<Self> {
        Self::new(datetime.timestamp(), datetime.timestamp_subsec_nanos() as i32)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => write!(f, "time({},{})", self.seconds, self.nanos),
        }
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Canonical rank of each value kind in the cross-kind total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeOrder {
    Null,
    Boolean,
    Number,
    Timestamp,
    String,
    Bytes,
    Reference,
    GeoPoint,
    Array,
    Vector,
    Map,
}

/// A storable document value.
///
/// `PartialEq` here is structural (`Integer(1) != Double(1.0)`); query
/// semantics use `executor::strict_equals` and `executor::compare_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Timestamp(Timestamp),
    Reference(ResourcePath),
    GeoPoint(GeoPoint),
    Array(Vec<Value>),
    Vector(Vec<f64>),
    Map(MapValue),
}

impl Value {
    pub fn type_order(&self) -> TypeOrder {
        match self {
            Value::Null => TypeOrder::Null,
            Value::Boolean(_) => TypeOrder::Boolean,
            Value::Integer(_) | Value::Double(_) => TypeOrder::Number,
            Value::Timestamp(_) => TypeOrder::Timestamp,
            Value::String(_) => TypeOrder::String,
            Value::Bytes(_) => TypeOrder::Bytes,
            Value::Reference(_) => TypeOrder::Reference,
            Value::GeoPoint(_) => TypeOrder::GeoPoint,
            Value::Array(_) => TypeOrder::Array,
            Value::Vector(_) => TypeOrder::Vector,
            Value::Map(_) => TypeOrder::Map,
        }
    }

    /// Short kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Reference(_) => "reference",
            Value::GeoPoint(_) => "geo point",
            Value::Array(_) => "array",
            Value::Vector(_) => "vector",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Double(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Double(d) if d.is_nan())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a decoded JSON tree into a typed value.
    ///
    /// Integral numbers that fit in `i64` become `Integer`; every other number
    /// becomes `Double`.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<GeoPoint> for Value {
    fn from(point: GeoPoint) -> Self {
        Value::GeoPoint(point)
    }
}

impl From<MapValue> for Value {
    fn from(map: MapValue) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_bounds() {
        assert!(Timestamp::new(Timestamp::MIN_SECONDS, 0).is_some());
        assert!(Timestamp::new(Timestamp::MIN_SECONDS - 1, 999_999_999).is_none());
        assert!(Timestamp::new(Timestamp::MAX_SECONDS, 999_999_999).is_some());
        assert!(Timestamp::new(Timestamp::MAX_SECONDS + 1, 0).is_none());
        assert!(Timestamp::new(0, -1).is_none());
        assert!(Timestamp::new(0, 1_000_000_000).is_none());
    }

    #[test]
    fn test_timestamp_unix_conversions() {
        let ts = Timestamp::from_unix_micros(-62_135_596_800_000_000).unwrap();
        assert_eq!(ts, Timestamp::MIN);
        assert!(Timestamp::from_unix_micros(-62_135_596_800_000_001).is_none());

        let ts = Timestamp::from_unix_millis(-1).unwrap();
        assert_eq!(ts.seconds(), -1);
        assert_eq!(ts.nanos(), 999_000_000);
        assert_eq!(ts.to_unix_millis(), -1);
        assert_eq!(ts.to_unix_seconds(), -1);

        let ts = Timestamp::new(-1, 999_999_999).unwrap();
        assert_eq!(ts.to_unix_micros(), -1);
    }

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::new(0, 0).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00Z");
        let ts = Timestamp::new(1, 500_000_000).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn test_timestamp_deserialize_rejects_out_of_range() {
        let ok: Result<Timestamp, _> = serde_json::from_value(json!({"seconds": 1, "nanos": 2}));
        assert!(ok.is_ok());
        let bad: Result<Timestamp, _> =
            serde_json::from_value(json!({"seconds": 1, "nanos": -2}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_from_json() {
        let value = Value::from_json(json!({
            "name": "Alice",
            "age": 30,
            "score": 4.5,
            "tags": ["a", null],
            "active": true
        }));
        let map = value.as_map().unwrap();
        assert_eq!(map["name"], Value::String("Alice".to_string()));
        assert_eq!(map["age"], Value::Integer(30));
        assert_eq!(map["score"], Value::Double(4.5));
        assert_eq!(
            map["tags"],
            Value::Array(vec![Value::String("a".to_string()), Value::Null])
        );
        assert_eq!(map["active"], Value::Boolean(true));
    }

    #[test]
    fn test_type_order_ranks() {
        assert!(TypeOrder::Null < TypeOrder::Boolean);
        assert!(TypeOrder::Number < TypeOrder::Timestamp);
        assert!(TypeOrder::Timestamp < TypeOrder::String);
        assert!(TypeOrder::Array < TypeOrder::Vector);
        assert!(TypeOrder::Vector < TypeOrder::Map);
        assert_eq!(Value::Integer(1).type_order(), Value::Double(1.0).type_order());
    }

    #[test]
    fn test_value_serde_tagging() {
        let json = serde_json::to_value(Value::Integer(7)).unwrap();
        assert_eq!(json, json!({"type": "integer", "value": 7}));
        let bytes = Value::Bytes(vec![1, 2, 3]);
        let back: Value = serde_json::from_value(serde_json::to_value(&bytes).unwrap()).unwrap();
        assert_eq!(back, bytes);
    }
}
