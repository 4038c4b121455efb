//! Core comparison helpers for the evaluator.
//!
//! This module contains:
//! - compare_values: the total order used by sort and logical max/min
//! - strict_equals: query equality (numeric cross-type, NaN never equal)
//! - strict_compare: ordering for `lt`/`lte`/`gt`/`gte` (same kind only)
//! - safe_regex / like_to_regex: bounded regex compilation

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};

use super::EvalConfig;
use crate::error::EvalError;
use crate::model::{MapValue, Value};

/// 2^63 as a double; the first double above every `i64`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Compare two doubles with NaN ordered before every other number and
/// `-0.0 == 0.0`.
#[inline]
pub fn compare_doubles(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // Neither is NaN, so partial_cmp always answers.
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare an integer against a double without losing precision.
#[inline]
pub fn compare_integer_double(i: i64, d: f64) -> Ordering {
    if d.is_nan() {
        return Ordering::Greater;
    }
    if d < -TWO_POW_63 {
        return Ordering::Greater;
    }
    if d >= TWO_POW_63 {
        return Ordering::Less;
    }
    let truncated = d.trunc();
    match i.cmp(&(truncated as i64)) {
        Ordering::Equal => compare_doubles(truncated, d),
        other => other,
    }
}

/// Numeric order over two number values. Non-numbers compare equal.
pub fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Double(x), Value::Double(y)) => compare_doubles(*x, *y),
        (Value::Integer(x), Value::Double(y)) => compare_integer_double(*x, *y),
        (Value::Double(x), Value::Integer(y)) => compare_integer_double(*y, *x).reverse(),
        _ => Ordering::Equal,
    }
}

fn compare_f64_slices(a: &[f64], b: &[f64]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match compare_doubles(*x, *y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

fn compare_maps(a: &MapValue, b: &MapValue) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        let ord = ka.cmp(kb).then_with(|| compare_values(va, vb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Total order across every value kind.
///
/// Null < Boolean < Number < Timestamp < String < Bytes < Reference <
/// GeoPoint < Array < Vector < Map. Integers and doubles share one numeric
/// order with NaN first. Vectors order by dimension before elements.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let kinds = a.type_order().cmp(&b.type_order());
    if kinds != Ordering::Equal {
        return kinds;
    }
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::Reference(x), Value::Reference(y)) => x.cmp(y),
        (Value::GeoPoint(x), Value::GeoPoint(y)) => compare_doubles(x.latitude, y.latitude)
            .then_with(|| compare_doubles(x.longitude, y.longitude)),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                match compare_values(l, r) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Vector(x), Value::Vector(y)) => x
            .len()
            .cmp(&y.len())
            .then_with(|| compare_f64_slices(x, y)),
        (Value::Map(x), Value::Map(y)) => compare_maps(x, y),
        _ => compare_numbers(a, b),
    }
}

fn numbers_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Double(x), Value::Double(y)) => x == y,
        (Value::Integer(x), Value::Double(y)) | (Value::Double(y), Value::Integer(x)) => {
            !y.is_nan() && compare_integer_double(*x, *y) == Ordering::Equal
        }
        _ => false,
    }
}

/// Fold element-wise equality results: any `false` wins, then any unknown.
fn combine_equalities(results: impl Iterator<Item = Option<bool>>) -> Option<bool> {
    let mut unknown = false;
    for result in results {
        match result {
            Some(false) => return Some(false),
            None => unknown = true,
            Some(true) => {}
        }
    }
    if unknown {
        None
    } else {
        Some(true)
    }
}

/// Query equality.
///
/// Returns `None` when the answer depends on a null: either side is null, or
/// a nested null decides the comparison. Different kinds are never equal and
/// NaN equals nothing. Arrays compare in order; maps by key set.
pub fn strict_equals(a: &Value, b: &Value) -> Option<bool> {
    if a.is_null() || b.is_null() {
        return None;
    }
    if a.type_order() != b.type_order() {
        return Some(false);
    }
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            if x.len() != y.len() {
                return Some(false);
            }
            combine_equalities(x.iter().zip(y).map(|(l, r)| strict_equals(l, r)))
        }
        (Value::Map(x), Value::Map(y)) => {
            if x.len() != y.len() || !x.keys().eq(y.keys()) {
                return Some(false);
            }
            combine_equalities(x.values().zip(y.values()).map(|(l, r)| strict_equals(l, r)))
        }
        (Value::Vector(x), Value::Vector(y)) => {
            Some(x.len() == y.len() && x.iter().zip(y).all(|(l, r)| l == r))
        }
        (Value::GeoPoint(x), Value::GeoPoint(y)) => {
            Some(x.latitude == y.latitude && x.longitude == y.longitude)
        }
        _ if a.is_number() => Some(numbers_equal(a, b)),
        _ => Some(a == b),
    }
}

/// Ordering for the inequality operators.
///
/// `None` means the operands are not comparable: different kinds, or a NaN
/// somewhere on the path that decides the comparison.
pub fn strict_compare(a: &Value, b: &Value) -> Option<Ordering> {
    if a.type_order() != b.type_order() {
        return None;
    }
    match (a, b) {
        _ if a.is_nan() || b.is_nan() => None,
        (Value::GeoPoint(x), Value::GeoPoint(y)) => {
            if x.latitude.is_nan()
                || x.longitude.is_nan()
                || y.latitude.is_nan()
                || y.longitude.is_nan()
            {
                return None;
            }
            Some(compare_values(a, b))
        }
        (Value::Vector(x), Value::Vector(y)) => {
            if x.iter().chain(y).any(|f| f.is_nan()) {
                return None;
            }
            Some(compare_values(a, b))
        }
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                match strict_compare(l, r)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        (Value::Map(x), Value::Map(y)) => {
            for ((ka, va), (kb, vb)) in x.iter().zip(y.iter()) {
                match ka.cmp(kb) {
                    Ordering::Equal => {}
                    other => return Some(other),
                }
                match strict_compare(va, vb)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        _ => Some(compare_values(a, b)),
    }
}

/// Safely compile a regex with the configured pattern-length and compiled
/// size limits.
pub fn safe_regex(
    function: &'static str,
    pattern: &str,
    config: &EvalConfig,
) -> Result<Regex, EvalError> {
    safe_regex_with(function, pattern, config, str::to_string)
}

/// Compile `build(pattern)` under the configured limits. The length limit
/// applies to the caller's `pattern`, not to its expansion.
pub fn safe_regex_with(
    function: &'static str,
    pattern: &str,
    config: &EvalConfig,
    build: impl FnOnce(&str) -> String,
) -> Result<Regex, EvalError> {
    if pattern.chars().count() > config.max_regex_pattern_len {
        return Err(EvalError::InvalidRegex {
            function,
            reason: format!(
                "pattern too long (max {} chars)",
                config.max_regex_pattern_len
            ),
        });
    }
    RegexBuilder::new(&build(pattern))
        .size_limit(config.regex_size_limit)
        .build()
        .map_err(|e| EvalError::InvalidRegex {
            function,
            reason: e.to_string(),
        })
}

/// Convert a SQL LIKE pattern into an anchored regex.
///
/// `%` matches any run of characters (including newlines), `_` exactly one.
pub fn like_to_regex(pattern: &str) -> String {
    let mut regex_pattern = String::with_capacity(pattern.len() + 8);
    regex_pattern.push_str("(?s)^");
    for c in pattern.chars() {
        match c {
            '%' => regex_pattern.push_str(".*"),
            '_' => regex_pattern.push('.'),
            _ => regex_pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    regex_pattern.push('$');
    regex_pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoPoint, ResourcePath, Timestamp};
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from_json(json)
    }

    #[test]
    fn test_compare_doubles_nan_first() {
        assert_eq!(compare_doubles(f64::NAN, f64::NEG_INFINITY), Ordering::Less);
        assert_eq!(compare_doubles(f64::NAN, f64::NAN), Ordering::Equal);
        assert_eq!(compare_doubles(-0.0, 0.0), Ordering::Equal);
        assert_eq!(compare_doubles(1.0, 2.0), Ordering::Less);
    }

    #[test]
    fn test_compare_integer_double_exact() {
        assert_eq!(compare_integer_double(1, 1.0), Ordering::Equal);
        assert_eq!(compare_integer_double(1, 1.5), Ordering::Less);
        assert_eq!(compare_integer_double(-1, -1.5), Ordering::Greater);
        assert_eq!(compare_integer_double(i64::MAX, TWO_POW_63), Ordering::Less);
        assert_eq!(compare_integer_double(i64::MIN, -TWO_POW_63), Ordering::Equal);
        assert_eq!(compare_integer_double(i64::MIN, f64::NEG_INFINITY), Ordering::Greater);
        // 2^53 + 1 is not representable as a double; the double rounds to 2^53.
        let big = 9_007_199_254_740_993i64;
        assert_eq!(compare_integer_double(big, big as f64), Ordering::Greater);
        assert_eq!(compare_integer_double(0, f64::NAN), Ordering::Greater);
    }

    #[test]
    fn test_compare_values_kind_order() {
        let ordered = vec![
            Value::Null,
            Value::Boolean(false),
            Value::Boolean(true),
            Value::Double(f64::NAN),
            Value::Integer(-5),
            Value::Double(2.5),
            Value::Timestamp(Timestamp::EPOCH),
            Value::String("a".to_string()),
            Value::Bytes(vec![0]),
            Value::Reference(ResourcePath::parse("a/b").unwrap()),
            Value::GeoPoint(GeoPoint::new(0.0, 0.0)),
            v(json!([1])),
            Value::Vector(vec![1.0]),
            v(json!({"a": 1})),
        ];
        for window in ordered.windows(2) {
            assert_eq!(
                compare_values(&window[0], &window[1]),
                Ordering::Less,
                "{:?} < {:?}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn test_compare_values_collections() {
        assert_eq!(compare_values(&v(json!([1, 2])), &v(json!([1, 3]))), Ordering::Less);
        assert_eq!(compare_values(&v(json!([1])), &v(json!([1, 0]))), Ordering::Less);
        assert_eq!(
            compare_values(&Value::Vector(vec![9.0]), &Value::Vector(vec![1.0, 1.0])),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&v(json!({"a": 1})), &v(json!({"b": 0}))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&v(json!({"a": 1})), &v(json!({"a": 1, "b": 0}))),
            Ordering::Less
        );
    }

    #[test]
    fn test_strict_equals() {
        assert_eq!(strict_equals(&Value::Integer(42), &Value::Double(42.0)), Some(true));
        assert_eq!(strict_equals(&Value::Double(-0.0), &Value::Integer(0)), Some(true));
        assert_eq!(
            strict_equals(&Value::Double(f64::NAN), &Value::Double(f64::NAN)),
            Some(false)
        );
        assert_eq!(
            strict_equals(&Value::Integer(1), &Value::String("1".to_string())),
            Some(false)
        );
        assert_eq!(strict_equals(&Value::Null, &Value::Integer(1)), None);
    }

    #[test]
    fn test_strict_equals_collections() {
        assert_eq!(strict_equals(&v(json!([1, 2])), &v(json!([1.0, 2]))), Some(true));
        assert_eq!(strict_equals(&v(json!([1, 2])), &v(json!([2, 1]))), Some(false));
        assert_eq!(
            strict_equals(&v(json!({"a": 1, "b": 2})), &v(json!({"b": 2, "a": 1}))),
            Some(true)
        );
        assert_eq!(strict_equals(&v(json!({"a": 1})), &v(json!({"b": 1}))), Some(false));
        assert_eq!(strict_equals(&v(json!([1, null])), &v(json!([1, null]))), None);
        assert_eq!(strict_equals(&v(json!([2, null])), &v(json!([1, null]))), Some(false));
    }

    #[test]
    fn test_strict_compare() {
        assert_eq!(
            strict_compare(&Value::Integer(1), &Value::Double(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(strict_compare(&Value::Integer(1), &Value::String("a".into())), None);
        assert_eq!(strict_compare(&Value::Double(f64::NAN), &Value::Integer(1)), None);
        assert_eq!(
            strict_compare(&v(json!(["a", 1])), &v(json!(["a", 2]))),
            Some(Ordering::Less)
        );
        assert_eq!(strict_compare(&v(json!([1])), &v(json!(["a"]))), None);
    }

    #[test]
    fn test_safe_regex_limits() {
        let config = EvalConfig::default();
        assert!(safe_regex("regex_match", "a+b", &config).is_ok());
        assert!(safe_regex("regex_match", "(", &config).is_err());
        let long = "a".repeat(config.max_regex_pattern_len + 1);
        let err = safe_regex("regex_match", &long, &config).unwrap_err();
        assert_eq!(err.function(), "regex_match");
    }

    #[test]
    fn test_safe_regex_limit_ignores_expansion() {
        let config = EvalConfig {
            max_regex_pattern_len: 4,
            ..EvalConfig::default()
        };
        let wrap = |p: &str| format!("^(?:{})$", p);
        assert!(safe_regex_with("regex_match", "a.b%", &config, wrap).is_ok());
        assert!(safe_regex_with("like", "a.b%", &config, like_to_regex).is_ok());
        assert!(safe_regex_with("like", "a.b%c", &config, like_to_regex).is_err());
    }

    #[test]
    fn test_like_to_regex() {
        let re = Regex::new(&like_to_regex("hello%")).unwrap();
        assert!(re.is_match("hello world"));
        assert!(!re.is_match("say hello"));

        let re = Regex::new(&like_to_regex("a_c")).unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("ac"));

        let re = Regex::new(&like_to_regex("1.5%")).unwrap();
        assert!(re.is_match("1.5 apples"));
        assert!(!re.is_match("105"));

        let re = Regex::new(&like_to_regex("%end")).unwrap();
        assert!(re.is_match("line\nend"));
    }
}
