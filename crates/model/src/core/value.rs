use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// A single scalar read from the source table.
///
/// Ordering is only defined inside a variant, with `Int` and `Float` treated as
/// one numeric family. Anything else (for example `Text` against `Timestamp`)
/// has no order and [`Value::compare`] returns `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Numeric view of the value. Text is accepted when it parses as a number,
    /// which is how scores arrive from `VARCHAR` columns.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) if v.is_finite() => Some(*v),
            Value::Text(v) => v.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => Some(cmp_float(*a, *b)),
            (Int(a), Float(b)) => Some(cmp_float(*a as f64, *b)),
            (Float(a), Int(b)) => Some(cmp_float(*a, *b as f64)),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// String form written to the key-value store, both for checkpoints and
    /// for loaded values. `Null` has no encoding.
    pub fn encode(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Text(v) => Some(v.clone()),
            Value::Timestamp(v) => Some(v.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }

    /// Decodes a stored string into the same variant as `self`.
    ///
    /// Used to read a persisted checkpoint back with the type of the freshly
    /// fetched tracking values.
    pub fn decode_like(&self, encoded: &str) -> Option<Value> {
        match self {
            Value::Null => None,
            Value::Int(_) => encoded
                .parse::<i64>()
                .map(Value::Int)
                .ok()
                .or_else(|| encoded.parse::<f64>().ok().map(Value::Float)),
            Value::Float(_) => encoded.parse::<f64>().ok().map(Value::Float),
            Value::Text(_) => Some(Value::Text(encoded.to_string())),
            Value::Timestamp(_) => DateTime::parse_from_rfc3339(encoded)
                .ok()
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc))),
        }
    }
}

/// Float order as PostgreSQL sorts it: NaN equals itself and is above every
/// other number.
fn cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Some(encoded) => f.write_str(&encoded),
            None => f.write_str("NULL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn numeric_family_compares_across_int_and_float() {
        assert_eq!(
            Value::Int(3).compare(&Value::Float(3.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float(3.0).compare(&Value::Int(3)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn nan_sorts_above_every_number() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan.compare(&Value::Float(f64::INFINITY)), Some(Ordering::Greater));
        assert_eq!(Value::Int(i64::MAX).compare(&nan), Some(Ordering::Less));
        assert_eq!(nan.compare(&Value::Float(f64::NAN)), Some(Ordering::Equal));
    }

    #[test]
    fn mismatched_variants_have_no_order() {
        let ts = Value::Timestamp(Utc::now());
        assert_eq!(Value::Text("a".into()).compare(&ts), None);
        assert_eq!(Value::Int(1).compare(&Value::Text("1".into())), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn timestamps_encode_with_fixed_microseconds() {
        let ts = Utc.with_ymd_and_hms(2025, 9, 18, 0, 0, 0).unwrap();
        assert_eq!(
            Value::Timestamp(ts).encode().as_deref(),
            Some("2025-09-18T00:00:00.000000Z")
        );
    }

    #[test]
    fn decode_like_reads_legacy_second_precision_timestamps() {
        let sample = Value::Timestamp(Utc::now());
        let decoded = sample.decode_like("2025-09-18T00:00:00Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 9, 18, 0, 0, 0).unwrap();
        assert_eq!(decoded, Value::Timestamp(expected));
    }

    #[test]
    fn text_scores_parse_as_numbers() {
        assert_eq!(Value::Text("3.14".into()).as_f64(), Some(3.14));
        assert_eq!(Value::Text("abc".into()).as_f64(), None);
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
    }
}
