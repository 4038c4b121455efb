//! Map builtin functions.

use crate::ast::Function;
use crate::error::EvalError;
use crate::executor::EvalOutcome;
use crate::model::{MapValue, Value};

use super::{expect_map, expect_string, type_mismatch};

/// `map(k1, v1, k2, v2, ...)`. Keys must be strings; values may be null.
/// A repeated key keeps its last value.
pub fn construct(args: Vec<EvalOutcome>) -> EvalOutcome {
    let mut map = MapValue::new();
    let mut args = args.into_iter();
    while let (Some(key), Some(value)) = (args.next(), args.next()) {
        if let Some(error) = key
            .as_argument_error("map")
            .or_else(|| value.as_argument_error("map"))
        {
            return error.into();
        }
        let key = match key {
            EvalOutcome::Value(Value::String(k)) => k,
            EvalOutcome::Value(other) => return type_mismatch("map", "string", &other).into(),
            _ => return type_mismatch("map", "string", &Value::Null).into(),
        };
        map.insert(key, value.into_value().unwrap_or(Value::Null));
    }
    EvalOutcome::Value(Value::Map(map))
}

/// Call a map function on mirrored arguments.
pub fn call(function: Function, args: &[Value]) -> EvalOutcome {
    let name = function.name();
    match function {
        Function::MapGet => match (expect_map(name, &args[0]), expect_string(name, &args[1])) {
            (Ok(map), Ok(key)) => match map.get(key) {
                Some(value) => value.clone().into(),
                None => EvalOutcome::Unset,
            },
            (Err(e), _) | (_, Err(e)) => e.into(),
        },
        Function::MapMerge => merge(name, args).into(),
        Function::MapRemove => match (expect_map(name, &args[0]), expect_string(name, &args[1])) {
            (Ok(map), Ok(key)) => {
                let mut map = map.clone();
                map.remove(key);
                EvalOutcome::Value(Value::Map(map))
            }
            (Err(e), _) | (_, Err(e)) => e.into(),
        },
        _ => EvalError::InvalidArgument {
            function: name,
            reason: "not a map function".to_string(),
        }
        .into(),
    }
}

/// Merge maps left to right; later keys win.
fn merge(function: &'static str, args: &[Value]) -> Result<Value, EvalError> {
    let mut merged = MapValue::new();
    for arg in args {
        let map = expect_map(function, arg)?;
        merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Ok(Value::Map(merged))
}
