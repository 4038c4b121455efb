//! Vector builtin functions.

use crate::ast::Function;
use crate::error::EvalError;
use crate::executor::EvalOutcome;
use crate::model::Value;

use super::expect_vector;

/// Call a vector function on mirrored arguments.
pub fn call(function: Function, args: &[Value]) -> EvalOutcome {
    let name = function.name();
    let result = match function {
        Function::VectorLength => {
            expect_vector(name, &args[0]).map(|v| Value::Integer(v.len() as i64))
        }
        Function::DotProduct => pair(name, args).map(|(a, b)| Value::Double(dot(a, b))),
        Function::EuclideanDistance => pair(name, args).map(|(a, b)| {
            let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
            Value::Double(sum.sqrt())
        }),
        Function::CosineDistance => pair(name, args).and_then(|(a, b)| {
            let magnitude = dot(a, a).sqrt() * dot(b, b).sqrt();
            if magnitude == 0.0 {
                return Err(EvalError::ZeroMagnitude { function: name });
            }
            Ok(Value::Double(1.0 - dot(a, b) / magnitude))
        }),
        _ => Err(EvalError::InvalidArgument {
            function: name,
            reason: "not a vector function".to_string(),
        }),
    };
    result.into()
}

/// Both operands as vectors of the same dimension.
fn pair<'a>(
    function: &'static str,
    args: &'a [Value],
) -> Result<(&'a [f64], &'a [f64]), EvalError> {
    let a = expect_vector(function, &args[0])?;
    let b = expect_vector(function, &args[1])?;
    if a.len() != b.len() {
        return Err(EvalError::DimensionMismatch {
            function,
            left: a.len(),
            right: b.len(),
        });
    }
    Ok((a, b))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
