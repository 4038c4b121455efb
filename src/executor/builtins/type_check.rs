//! Type checking and error handling builtin functions.
//!
//! These see raw outcomes: each one decides for itself what `Null`, `Unset`
//! and `Error` mean.

use crate::ast::Function;
use crate::error::EvalError;
use crate::executor::EvalOutcome;

use super::type_mismatch;

/// Call a type checking function on unmirrored arguments.
pub fn call(function: Function, args: Vec<EvalOutcome>) -> EvalOutcome {
    let name = function.name();
    let mut args = args.into_iter();
    let first = args.next().unwrap_or(EvalOutcome::Unset);

    match function {
        Function::IsError => EvalOutcome::boolean(first.is_error()),

        Function::IfError => match first {
            EvalOutcome::Error(_) => args.next().unwrap_or(EvalOutcome::Unset),
            other => other,
        },

        Function::Exists => match first {
            EvalOutcome::Error(e) => e.into(),
            other => EvalOutcome::boolean(!other.is_unset()),
        },

        Function::IsAbsent => match first {
            EvalOutcome::Error(e) => e.into(),
            other => EvalOutcome::boolean(other.is_unset()),
        },

        Function::IsNull | Function::IsNotNull => match first {
            EvalOutcome::Error(e) => e.into(),
            EvalOutcome::Unset => EvalError::UnsetArgument { function: name }.into(),
            other => EvalOutcome::boolean(other.is_null() == (function == Function::IsNull)),
        },

        Function::IsNan | Function::IsNotNan => match first {
            EvalOutcome::Error(e) => e.into(),
            EvalOutcome::Unset => EvalError::UnsetArgument { function: name }.into(),
            EvalOutcome::Null => EvalOutcome::Null,
            EvalOutcome::Value(value) if value.is_number() => {
                EvalOutcome::boolean(value.is_nan() == (function == Function::IsNan))
            }
            EvalOutcome::Value(other) => type_mismatch(name, "number", &other).into(),
        },

        _ => EvalError::InvalidArgument {
            function: name,
            reason: "not a type check function".to_string(),
        }
        .into(),
    }
}
