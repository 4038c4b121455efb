//! Builtin functions for pipeline expressions.
//!
//! Each family lives in its own module and works on already-evaluated
//! arguments. Most functions are strict: `dispatch` applies the mirroring law
//! (an `Unset` or `Error` argument gives `Error`, otherwise a `Null` argument
//! gives `Null`) before the family code ever sees a value. Type checks and
//! the `array`/`map` constructors inspect raw outcomes themselves, and the
//! logical family evaluates its own arguments.

mod array;
mod comparison;
pub(crate) mod logical;
mod map;
mod math;
mod string;
mod timestamp;
mod type_check;
mod vector;

use crate::ast::{Function, FunctionFamily};
use crate::error::EvalError;
use crate::model::{MapValue, Timestamp, Value};

use super::{EvalConfig, EvalOutcome};

/// Apply a non-logical function to evaluated arguments.
pub(crate) fn dispatch(
    function: Function,
    args: Vec<EvalOutcome>,
    config: &EvalConfig,
) -> EvalOutcome {
    match function {
        Function::Array => return array::construct(args),
        Function::Map => return map::construct(args),
        _ if function.family() == FunctionFamily::TypeCheck => {
            return type_check::call(function, args)
        }
        _ => {}
    }

    let values = match mirror(function.name(), args) {
        Ok(values) => values,
        Err(outcome) => return outcome,
    };

    match function.family() {
        FunctionFamily::Arithmetic => math::call(function, &values),
        FunctionFamily::Comparison => comparison::call(function, &values),
        FunctionFamily::Array => array::call(function, &values),
        FunctionFamily::String => string::call(function, &values, config),
        FunctionFamily::Map => map::call(function, &values),
        FunctionFamily::Timestamp => timestamp::call(function, &values),
        FunctionFamily::Vector => vector::call(function, &values),
        FunctionFamily::Logical | FunctionFamily::TypeCheck => {
            EvalOutcome::Error(EvalError::InvalidArgument {
                function: function.name(),
                reason: "not a strict function".to_string(),
            })
        }
    }
}

/// The mirroring law: unwrap every argument to a value, or return the
/// outcome the whole call collapses to.
fn mirror(
    function: &'static str,
    args: Vec<EvalOutcome>,
) -> Result<Vec<Value>, EvalOutcome> {
    if let Some(error) = args.iter().find_map(|a| a.as_argument_error(function)) {
        return Err(EvalOutcome::Error(error));
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            EvalOutcome::Value(v) => values.push(v),
            _ => return Err(EvalOutcome::Null),
        }
    }
    Ok(values)
}

pub(super) fn type_mismatch(
    function: &'static str,
    expected: &'static str,
    found: &Value,
) -> EvalError {
    EvalError::TypeMismatch {
        function,
        expected,
        found: found.kind_name(),
    }
}

pub(super) fn expect_number(function: &'static str, value: &Value) -> Result<f64, EvalError> {
    value
        .as_f64()
        .ok_or_else(|| type_mismatch(function, "number", value))
}

pub(super) fn expect_integer(function: &'static str, value: &Value) -> Result<i64, EvalError> {
    value
        .as_i64()
        .ok_or_else(|| type_mismatch(function, "integer", value))
}

pub(super) fn expect_string<'a>(
    function: &'static str,
    value: &'a Value,
) -> Result<&'a str, EvalError> {
    value
        .as_str()
        .ok_or_else(|| type_mismatch(function, "string", value))
}

pub(super) fn expect_array<'a>(
    function: &'static str,
    value: &'a Value,
) -> Result<&'a [Value], EvalError> {
    value
        .as_array()
        .ok_or_else(|| type_mismatch(function, "array", value))
}

pub(super) fn expect_map<'a>(
    function: &'static str,
    value: &'a Value,
) -> Result<&'a MapValue, EvalError> {
    value
        .as_map()
        .ok_or_else(|| type_mismatch(function, "map", value))
}

pub(super) fn expect_timestamp(
    function: &'static str,
    value: &Value,
) -> Result<Timestamp, EvalError> {
    match value {
        Value::Timestamp(ts) => Ok(*ts),
        other => Err(type_mismatch(function, "timestamp", other)),
    }
}

pub(super) fn expect_vector<'a>(
    function: &'static str,
    value: &'a Value,
) -> Result<&'a [f64], EvalError> {
    match value {
        Value::Vector(v) => Ok(v),
        other => Err(type_mismatch(function, "vector", other)),
    }
}
