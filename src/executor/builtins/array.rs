//! Array builtin functions.

use crate::ast::Function;
use crate::error::EvalError;
use crate::executor::EvalOutcome;
use crate::model::Value;

use super::comparison::{any_equal, from_option};
use super::{expect_array, expect_integer};

/// `array(...)`: null elements are kept, unset or error elements fail.
pub fn construct(args: Vec<EvalOutcome>) -> EvalOutcome {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        if let Some(error) = arg.as_argument_error("array") {
            return error.into();
        }
        values.extend(arg.into_value());
    }
    EvalOutcome::Value(Value::Array(values))
}

/// Call an array function on mirrored arguments.
pub fn call(function: Function, args: &[Value]) -> EvalOutcome {
    let name = function.name();
    let array = match expect_array(name, &args[0]) {
        Ok(array) => array,
        Err(e) => return e.into(),
    };

    match function {
        Function::ArrayContains => from_option(any_equal(&args[1], array)),

        Function::ArrayContainsAny => match expect_array(name, &args[1]) {
            Ok(candidates) => from_option(contains_any(array, candidates)),
            Err(e) => e.into(),
        },

        Function::ArrayContainsAll => match expect_array(name, &args[1]) {
            Ok(candidates) => from_option(contains_all(array, candidates)),
            Err(e) => e.into(),
        },

        Function::ArrayLength => EvalOutcome::Value(Value::Integer(array.len() as i64)),

        Function::ArrayConcat => {
            let mut joined = array.to_vec();
            for arg in &args[1..] {
                match expect_array(name, arg) {
                    Ok(more) => joined.extend_from_slice(more),
                    Err(e) => return e.into(),
                }
            }
            EvalOutcome::Value(Value::Array(joined))
        }

        Function::ArrayReverse => {
            EvalOutcome::Value(Value::Array(array.iter().rev().cloned().collect()))
        }

        Function::ArrayGet => match expect_integer(name, &args[1]) {
            Ok(index) => element_at(array, index),
            Err(e) => e.into(),
        },

        _ => EvalError::InvalidArgument {
            function: name,
            reason: "not an array function".to_string(),
        }
        .into(),
    }
}

fn contains_any(array: &[Value], candidates: &[Value]) -> Option<bool> {
    let mut unknown = false;
    for candidate in candidates {
        match any_equal(candidate, array) {
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

fn contains_all(array: &[Value], candidates: &[Value]) -> Option<bool> {
    let mut unknown = false;
    for candidate in candidates {
        match any_equal(candidate, array) {
            Some(true) => {}
            None => unknown = true,
            Some(false) => return Some(false),
        }
    }
    if unknown {
        None
    } else {
        Some(true)
    }
}

/// Element at `index`; negative indexes count from the end. Out of range is
/// `Unset`, like a missing field.
fn element_at(array: &[Value], index: i64) -> EvalOutcome {
    let len = array.len() as i64;
    let resolved = if index < 0 { len + index } else { index };
    if resolved < 0 || resolved >= len {
        return EvalOutcome::Unset;
    }
    array[resolved as usize].clone().into()
}
