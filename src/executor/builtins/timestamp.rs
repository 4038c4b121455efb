//! Timestamp builtin functions.
//!
//! Arithmetic runs on epoch nanoseconds in `i128`, so no intermediate step
//! can overflow; only the final range check can fail.

use crate::ast::Function;
use crate::error::EvalError;
use crate::executor::EvalOutcome;
use crate::model::{Timestamp, Value};

use super::{expect_integer, expect_string, expect_timestamp};

/// Call a timestamp function on mirrored arguments.
pub fn call(function: Function, args: &[Value]) -> EvalOutcome {
    let name = function.name();
    let out_of_range = EvalError::TimestampOutOfRange { function: name };
    let result = match function {
        Function::UnixMicrosToTimestamp => expect_integer(name, &args[0]).and_then(|micros| {
            Timestamp::from_unix_micros(micros)
                .map(Value::Timestamp)
                .ok_or(out_of_range)
        }),
        Function::UnixMillisToTimestamp => expect_integer(name, &args[0]).and_then(|millis| {
            Timestamp::from_unix_millis(millis)
                .map(Value::Timestamp)
                .ok_or(out_of_range)
        }),
        Function::UnixSecondsToTimestamp => expect_integer(name, &args[0]).and_then(|secs| {
            Timestamp::from_unix_seconds(secs)
                .map(Value::Timestamp)
                .ok_or(out_of_range)
        }),

        Function::TimestampToUnixMicros => {
            expect_timestamp(name, &args[0]).map(|ts| Value::Integer(ts.to_unix_micros()))
        }
        Function::TimestampToUnixMillis => {
            expect_timestamp(name, &args[0]).map(|ts| Value::Integer(ts.to_unix_millis()))
        }
        Function::TimestampToUnixSeconds => {
            expect_timestamp(name, &args[0]).map(|ts| Value::Integer(ts.to_unix_seconds()))
        }

        Function::TimestampAdd => shift(name, args, 1),
        Function::TimestampSub => shift(name, args, -1),

        _ => Err(EvalError::InvalidArgument {
            function: name,
            reason: "not a timestamp function".to_string(),
        }),
    };
    result.into()
}

/// Nanoseconds in one `unit`.
fn unit_nanos(function: &'static str, unit: &str) -> Result<i128, EvalError> {
    let nanos = match unit {
        "microsecond" => 1_000,
        "millisecond" => 1_000_000,
        "second" => 1_000_000_000,
        "minute" => 60 * 1_000_000_000,
        "hour" => 3_600 * 1_000_000_000,
        "day" => 86_400 * 1_000_000_000,
        other => {
            return Err(EvalError::InvalidArgument {
                function,
                reason: format!("unknown time unit '{}'", other),
            })
        }
    };
    Ok(nanos)
}

/// `timestamp_add(ts, unit, amount)` / `timestamp_sub(ts, unit, amount)`.
fn shift(function: &'static str, args: &[Value], sign: i128) -> Result<Value, EvalError> {
    let ts = expect_timestamp(function, &args[0])?;
    let unit = unit_nanos(function, expect_string(function, &args[1])?)?;
    let amount = expect_integer(function, &args[2])? as i128;
    let shifted = ts.epoch_nanos() + sign * amount * unit;
    Timestamp::from_epoch_nanos(shifted)
        .map(Value::Timestamp)
        .ok_or(EvalError::TimestampOutOfRange { function })
}
