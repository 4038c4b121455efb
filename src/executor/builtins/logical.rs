//! Logical builtin functions.
//!
//! These are not mirrored. `and`/`or` follow three-valued logic extended with
//! errors: a deciding operand (`false` for `and`, `true` for `or`) wins over
//! errors and nulls, then an error wins over a null. Operands are evaluated
//! lazily, left to right, stopping at the first deciding operand.

use std::cmp::Ordering;

use crate::ast::{Expression, Function};
use crate::error::EvalError;
use crate::executor::helpers::compare_values;
use crate::executor::EvalOutcome;
use crate::model::Value;

use super::type_mismatch;

/// Call a logical function, evaluating operands through `eval`.
pub(crate) fn call<F>(function: Function, args: &[Expression], mut eval: F) -> EvalOutcome
where
    F: FnMut(&Expression) -> EvalOutcome,
{
    let name = function.name();
    match function {
        Function::And => connective(name, args, eval, false),
        Function::Or => connective(name, args, eval, true),

        Function::Xor => {
            let mut trues = 0usize;
            let mut null = false;
            for arg in args {
                match eval(arg) {
                    EvalOutcome::Value(Value::Boolean(b)) => trues += b as usize,
                    EvalOutcome::Null => null = true,
                    other => return operand_error(name, other).into(),
                }
            }
            if null {
                EvalOutcome::Null
            } else {
                EvalOutcome::boolean(trues % 2 == 1)
            }
        }

        Function::Not => match eval(&args[0]) {
            EvalOutcome::Value(Value::Boolean(b)) => EvalOutcome::boolean(!b),
            EvalOutcome::Null => EvalOutcome::Null,
            other => operand_error(name, other).into(),
        },

        Function::Cond => match eval(&args[0]) {
            EvalOutcome::Value(Value::Boolean(true)) => eval(&args[1]),
            EvalOutcome::Value(Value::Boolean(false)) | EvalOutcome::Null => eval(&args[2]),
            other => operand_error(name, other).into(),
        },

        Function::LogicalMaximum => extremum(args, eval, Ordering::Greater),
        Function::LogicalMinimum => extremum(args, eval, Ordering::Less),

        _ => EvalError::InvalidArgument {
            function: name,
            reason: "not a logical function".to_string(),
        }
        .into(),
    }
}

/// Error for an operand that is not a boolean or null.
fn operand_error(function: &'static str, outcome: EvalOutcome) -> EvalError {
    match outcome {
        EvalOutcome::Error(e) => e,
        EvalOutcome::Value(v) => type_mismatch(function, "boolean", &v),
        _ => EvalError::UnsetArgument { function },
    }
}

/// `and` (decider `false`) or `or` (decider `true`).
fn connective<F>(
    function: &'static str,
    args: &[Expression],
    mut eval: F,
    decider: bool,
) -> EvalOutcome
where
    F: FnMut(&Expression) -> EvalOutcome,
{
    let mut error = None;
    let mut null = false;
    for arg in args {
        match eval(arg) {
            EvalOutcome::Value(Value::Boolean(b)) if b == decider => {
                return EvalOutcome::boolean(decider)
            }
            EvalOutcome::Value(Value::Boolean(_)) => {}
            EvalOutcome::Null => null = true,
            other => {
                error.get_or_insert_with(|| operand_error(function, other));
            }
        }
    }
    match error {
        Some(e) => e.into(),
        None if null => EvalOutcome::Null,
        None => EvalOutcome::boolean(!decider),
    }
}

/// Greatest (`want = Greater`) or least value. Null and unset operands are
/// skipped; if nothing is left the result is null.
fn extremum<F>(args: &[Expression], mut eval: F, want: Ordering) -> EvalOutcome
where
    F: FnMut(&Expression) -> EvalOutcome,
{
    let mut best: Option<Value> = None;
    for arg in args {
        match eval(arg) {
            EvalOutcome::Value(value) => {
                let replace = match &best {
                    Some(current) => compare_values(&value, current) == want,
                    None => true,
                };
                if replace {
                    best = Some(value);
                }
            }
            EvalOutcome::Null | EvalOutcome::Unset => {}
            EvalOutcome::Error(e) => return e.into(),
        }
    }
    best.map_or(EvalOutcome::Null, EvalOutcome::Value)
}
