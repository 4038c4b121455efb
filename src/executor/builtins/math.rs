//! Arithmetic builtin functions.
//!
//! Integer/integer arithmetic stays integral and reports overflow; any double
//! operand promotes the operation to IEEE-754 doubles.

use crate::ast::Function;
use crate::error::EvalError;
use crate::model::Value;

use super::{expect_number, type_mismatch};
use crate::executor::EvalOutcome;

/// Call an arithmetic function on mirrored arguments.
pub fn call(function: Function, args: &[Value]) -> EvalOutcome {
    let name = function.name();
    let result = match function {
        Function::Add
        | Function::Subtract
        | Function::Multiply
        | Function::Divide
        | Function::Mod => binary(function, &args[0], &args[1]),

        Function::Pow => {
            let base = expect_number(name, &args[0]);
            let exponent = expect_number(name, &args[1]);
            base.and_then(|b| exponent.map(|e| Value::Double(b.powf(e))))
        }

        Function::Exp => expect_number(name, &args[0]).map(|x| Value::Double(x.exp())),

        Function::Ln => non_negative(name, &args[0]).map(|x| Value::Double(x.ln())),

        Function::Log10 => non_negative(name, &args[0]).map(|x| Value::Double(x.log10())),

        Function::Log => log(name, &args[0], &args[1]),

        Function::Sqrt => non_negative(name, &args[0]).map(|x| Value::Double(x.sqrt())),

        Function::Abs => match &args[0] {
            Value::Integer(i) => i
                .checked_abs()
                .map(Value::Integer)
                .ok_or(EvalError::Overflow { function: name }),
            other => expect_number(name, other).map(|x| Value::Double(x.abs())),
        },

        Function::Ceil => round_with(name, &args[0], f64::ceil),
        Function::Floor => round_with(name, &args[0], f64::floor),
        // f64::round rounds half away from zero.
        Function::Round => round_with(name, &args[0], f64::round),

        _ => Err(EvalError::InvalidArgument {
            function: name,
            reason: "not an arithmetic function".to_string(),
        }),
    };
    result.into()
}

fn binary(function: Function, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let name = function.name();
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        return integer_op(function, *a, *b).map(Value::Integer);
    }
    let a = expect_number(name, left)?;
    let b = expect_number(name, right)?;
    let result = match function {
        Function::Add => a + b,
        Function::Subtract => a - b,
        Function::Multiply => a * b,
        Function::Divide => a / b,
        // Rust's `%` on doubles is fmod: the sign follows the dividend.
        _ => a % b,
    };
    Ok(Value::Double(result))
}

fn integer_op(function: Function, a: i64, b: i64) -> Result<i64, EvalError> {
    let name = function.name();
    let overflow = EvalError::Overflow { function: name };
    match function {
        Function::Add => a.checked_add(b).ok_or(overflow),
        Function::Subtract => a.checked_sub(b).ok_or(overflow),
        Function::Multiply => a.checked_mul(b).ok_or(overflow),
        Function::Divide => {
            if b == 0 {
                return Err(EvalError::DivisionByZero { function: name });
            }
            a.checked_div(b).ok_or(overflow)
        }
        _ => {
            if b == 0 {
                return Err(EvalError::DivisionByZero { function: name });
            }
            // i64::MIN % -1 is mathematically 0.
            Ok(a.wrapping_rem(b))
        }
    }
}

fn non_negative(function: &'static str, value: &Value) -> Result<f64, EvalError> {
    let x = expect_number(function, value)?;
    if x < 0.0 {
        return Err(EvalError::InvalidArgument {
            function,
            reason: format!("{} is negative", x),
        });
    }
    Ok(x)
}

fn log(function: &'static str, value: &Value, base: &Value) -> Result<Value, EvalError> {
    let x = non_negative(function, value)?;
    let base = expect_number(function, base)?;
    if base <= 0.0 || base == 1.0 {
        return Err(EvalError::InvalidArgument {
            function,
            reason: format!("invalid base {}", base),
        });
    }
    Ok(Value::Double(x.ln() / base.ln()))
}

fn round_with(
    function: &'static str,
    value: &Value,
    op: fn(f64) -> f64,
) -> Result<Value, EvalError> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        Value::Double(d) => Ok(Value::Double(op(*d))),
        other => Err(type_mismatch(function, "number", other)),
    }
}
