//! Comparison builtin functions.

use std::cmp::Ordering;

use crate::ast::Function;
use crate::error::EvalError;
use crate::executor::helpers::{strict_compare, strict_equals};
use crate::executor::EvalOutcome;
use crate::model::Value;

use super::expect_array;

/// Call a comparison function on mirrored arguments.
pub fn call(function: Function, args: &[Value]) -> EvalOutcome {
    let (left, right) = (&args[0], &args[1]);
    match function {
        Function::Eq => from_option(strict_equals(left, right)),
        Function::Neq => from_option(strict_equals(left, right).map(|eq| !eq)),
        Function::Lt => inequality(left, right, |o| o == Ordering::Less),
        Function::Lte => inequality(left, right, |o| o != Ordering::Greater),
        Function::Gt => inequality(left, right, |o| o == Ordering::Greater),
        Function::Gte => inequality(left, right, |o| o != Ordering::Less),
        Function::EqAny => match expect_array(function.name(), right) {
            Ok(candidates) => from_option(any_equal(left, candidates)),
            Err(e) => e.into(),
        },
        Function::NotEqAny => match expect_array(function.name(), right) {
            Ok(candidates) => from_option(any_equal(left, candidates).map(|found| !found)),
            Err(e) => e.into(),
        },
        _ => EvalError::InvalidArgument {
            function: function.name(),
            reason: "not a comparison function".to_string(),
        }
        .into(),
    }
}

/// `Some(b)` becomes a boolean, `None` (decided by a null) becomes `Null`.
pub(super) fn from_option(result: Option<bool>) -> EvalOutcome {
    match result {
        Some(b) => EvalOutcome::boolean(b),
        None => EvalOutcome::Null,
    }
}

/// Whether `needle` equals any element: a match wins, then any comparison
/// decided by a null, then `false`.
pub(super) fn any_equal(needle: &Value, haystack: &[Value]) -> Option<bool> {
    let mut unknown = needle.is_null();
    for candidate in haystack {
        match strict_equals(needle, candidate) {
            Some(true) => return Some(true),
            None => unknown = true,
            Some(false) => {}
        }
    }
    if unknown {
        None
    } else {
        Some(false)
    }
}

fn inequality(left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> EvalOutcome {
    EvalOutcome::boolean(strict_compare(left, right).map_or(false, accept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from_json(json)
    }

    fn t() -> EvalOutcome {
        EvalOutcome::boolean(true)
    }

    fn f() -> EvalOutcome {
        EvalOutcome::boolean(false)
    }

    #[test]
    fn test_eq_numeric_cross_type() {
        assert_eq!(call(Function::Eq, &[v(json!(42)), v(json!(42.0))]), t());
        assert_eq!(call(Function::Neq, &[v(json!(42)), v(json!(42.0))]), f());
        assert_eq!(
            call(Function::Eq, &[Value::Double(f64::NAN), Value::Double(f64::NAN)]),
            f()
        );
        assert_eq!(
            call(Function::Neq, &[Value::Double(f64::NAN), Value::Double(f64::NAN)]),
            t()
        );
    }

    #[test]
    fn test_eq_type_mismatch_is_false() {
        assert_eq!(call(Function::Eq, &[v(json!(1)), v(json!("1"))]), f());
        assert_eq!(call(Function::Neq, &[v(json!(true)), v(json!(1))]), t());
    }

    #[test]
    fn test_eq_nested_null_is_null() {
        assert_eq!(
            call(Function::Eq, &[v(json!([1, null])), v(json!([1, null]))]),
            EvalOutcome::Null
        );
        assert_eq!(
            call(Function::Eq, &[v(json!({"a": null})), v(json!({"a": 1}))]),
            EvalOutcome::Null
        );
    }

    #[test]
    fn test_inequalities() {
        assert_eq!(call(Function::Lt, &[v(json!(1)), v(json!(1.5))]), t());
        assert_eq!(call(Function::Lte, &[v(json!(2)), v(json!(2.0))]), t());
        assert_eq!(call(Function::Gt, &[v(json!("b")), v(json!("a"))]), t());
        assert_eq!(call(Function::Gte, &[v(json!(1)), v(json!(2))]), f());
    }

    #[test]
    fn test_inequality_cross_type_and_nan_false() {
        for function in [Function::Lt, Function::Lte, Function::Gt, Function::Gte] {
            assert_eq!(call(function, &[v(json!(1)), v(json!("1"))]), f());
            assert_eq!(call(function, &[Value::Double(f64::NAN), v(json!(1))]), f());
            assert_eq!(
                call(function, &[Value::Double(f64::NAN), Value::Double(f64::NAN)]),
                f()
            );
        }
    }

    #[test]
    fn test_eq_any() {
        assert_eq!(call(Function::EqAny, &[v(json!(2)), v(json!([1, 2.0]))]), t());
        assert_eq!(call(Function::EqAny, &[v(json!(3)), v(json!([1, 2]))]), f());
        assert_eq!(
            call(Function::EqAny, &[v(json!(3)), v(json!([1, null]))]),
            EvalOutcome::Null
        );
        assert_eq!(call(Function::EqAny, &[v(json!(1)), v(json!([1, null]))]), t());
        assert!(call(Function::EqAny, &[v(json!(1)), v(json!(1))]).is_error());
        assert_eq!(call(Function::NotEqAny, &[v(json!(3)), v(json!([1, 2]))]), t());
        assert_eq!(call(Function::NotEqAny, &[v(json!(1)), v(json!([1, 2]))]), f());
    }
}
