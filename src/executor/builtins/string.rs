//! String builtin functions.
//!
//! Lengths and positions are in Unicode code points for strings and in bytes
//! for byte strings.

use crate::ast::Function;
use crate::error::EvalError;
use crate::executor::helpers::{like_to_regex, safe_regex_with};
use crate::executor::{EvalConfig, EvalOutcome};
use crate::model::Value;

use super::{expect_integer, expect_string, type_mismatch};

/// Call a string function on mirrored arguments.
pub fn call(function: Function, args: &[Value], config: &EvalConfig) -> EvalOutcome {
    let name = function.name();
    let result = match function {
        Function::Concat => concat(name, args),

        Function::ByteLength => match &args[0] {
            Value::String(s) => Ok(Value::Integer(s.len() as i64)),
            Value::Bytes(b) => Ok(Value::Integer(b.len() as i64)),
            other => Err(type_mismatch(name, "string or bytes", other)),
        },

        Function::CharLength => {
            expect_string(name, &args[0]).map(|s| Value::Integer(s.chars().count() as i64))
        }

        Function::ToLower => map_str(name, &args[0], |s| s.to_lowercase()),
        Function::ToUpper => map_str(name, &args[0], |s| s.to_uppercase()),
        Function::Trim => map_str(name, &args[0], |s| s.trim().to_string()),
        Function::Ltrim => map_str(name, &args[0], |s| s.trim_start().to_string()),
        Function::Rtrim => map_str(name, &args[0], |s| s.trim_end().to_string()),

        Function::Like => regex_test(name, args, config, like_to_regex),
        Function::RegexMatch => regex_test(name, args, config, |p| format!("^(?:{})$", p)),
        Function::RegexContains => regex_test(name, args, config, str::to_string),

        Function::StartsWith => {
            str_pair(name, args).map(|(s, prefix)| Value::Boolean(s.starts_with(prefix)))
        }
        Function::EndsWith => {
            str_pair(name, args).map(|(s, suffix)| Value::Boolean(s.ends_with(suffix)))
        }
        Function::StringContains => {
            str_pair(name, args).map(|(s, needle)| Value::Boolean(s.contains(needle)))
        }

        Function::Substring => substring(name, args),

        Function::StringReverse => match &args[0] {
            Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
            Value::Bytes(b) => Ok(Value::Bytes(b.iter().rev().copied().collect())),
            other => Err(type_mismatch(name, "string or bytes", other)),
        },

        _ => Err(EvalError::InvalidArgument {
            function: name,
            reason: "not a string function".to_string(),
        }),
    };
    result.into()
}

/// Join strings, byte strings or arrays. Every operand must be the same kind.
fn concat(function: &'static str, args: &[Value]) -> Result<Value, EvalError> {
    const EXPECTED: &str = "string, bytes or array";
    match &args[0] {
        Value::String(_) => {
            let mut joined = String::new();
            for arg in args {
                match arg {
                    Value::String(s) => joined.push_str(s),
                    other => return Err(type_mismatch(function, "string", other)),
                }
            }
            Ok(Value::String(joined))
        }
        Value::Bytes(_) => {
            let mut joined = Vec::new();
            for arg in args {
                match arg {
                    Value::Bytes(b) => joined.extend_from_slice(b),
                    other => return Err(type_mismatch(function, "bytes", other)),
                }
            }
            Ok(Value::Bytes(joined))
        }
        Value::Array(_) => {
            let mut joined = Vec::new();
            for arg in args {
                match arg {
                    Value::Array(items) => joined.extend_from_slice(items),
                    other => return Err(type_mismatch(function, "array", other)),
                }
            }
            Ok(Value::Array(joined))
        }
        other => Err(type_mismatch(function, EXPECTED, other)),
    }
}

fn map_str(
    function: &'static str,
    value: &Value,
    op: impl Fn(&str) -> String,
) -> Result<Value, EvalError> {
    expect_string(function, value).map(|s| Value::String(op(s)))
}

fn str_pair<'a>(
    function: &'static str,
    args: &'a [Value],
) -> Result<(&'a str, &'a str), EvalError> {
    Ok((
        expect_string(function, &args[0])?,
        expect_string(function, &args[1])?,
    ))
}

/// Compile `build(pattern)` and test it against the first argument. The
/// length limit applies to the pattern as given.
fn regex_test(
    function: &'static str,
    args: &[Value],
    config: &EvalConfig,
    build: impl FnOnce(&str) -> String,
) -> Result<Value, EvalError> {
    let (s, pattern) = str_pair(function, args)?;
    let re = safe_regex_with(function, pattern, config, build)?;
    Ok(Value::Boolean(re.is_match(s)))
}

/// Resolve `[position, position + length)` over a sequence of `len` items.
/// A negative position counts from the end.
fn substring_range(
    function: &'static str,
    len: usize,
    position: i64,
    length: Option<i64>,
) -> Result<(usize, usize), EvalError> {
    let len = len as i64;
    let start = if position < 0 {
        (len + position).max(0)
    } else {
        position.min(len)
    };
    let end = match length {
        None => len,
        Some(l) if l < 0 => {
            return Err(EvalError::InvalidArgument {
                function,
                reason: format!("negative length {}", l),
            })
        }
        Some(l) => start.saturating_add(l).min(len),
    };
    Ok((start as usize, end as usize))
}

fn substring(function: &'static str, args: &[Value]) -> Result<Value, EvalError> {
    let position = expect_integer(function, &args[1])?;
    let length = match args.get(2) {
        Some(l) => Some(expect_integer(function, l)?),
        None => None,
    };
    match &args[0] {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = substring_range(function, chars.len(), position, length)?;
            Ok(Value::String(chars[start..end].iter().collect()))
        }
        Value::Bytes(b) => {
            let (start, end) = substring_range(function, b.len(), position, length)?;
            Ok(Value::Bytes(b[start..end].to_vec()))
        }
        other => Err(type_mismatch(function, "string or bytes", other)),
    }
}
