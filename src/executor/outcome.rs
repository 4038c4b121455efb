//! The four-state result of evaluating an expression.

use crate::error::EvalError;
use crate::model::Value;

/// Result of evaluating one expression against one document.
///
/// `Value` never holds `Value::Null`; an explicit null is always reported as
/// `EvalOutcome::Null` so callers only have one place to look for it.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    /// A present, non-null value.
    Value(Value),
    /// An explicit null, stored or produced.
    Null,
    /// The referenced field does not exist.
    Unset,
    /// A function's domain was violated.
    Error(EvalError),
}

impl EvalOutcome {
    pub fn boolean(b: bool) -> Self {
        EvalOutcome::Value(Value::Boolean(b))
    }

    pub fn is_value(&self) -> bool {
        matches!(self, EvalOutcome::Value(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EvalOutcome::Null)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, EvalOutcome::Unset)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvalOutcome::Error(_))
    }

    /// True only for a boolean `true` value.
    pub fn is_true(&self) -> bool {
        matches!(self, EvalOutcome::Value(Value::Boolean(true)))
    }

    /// True only for a boolean `false` value.
    pub fn is_false(&self) -> bool {
        matches!(self, EvalOutcome::Value(Value::Boolean(false)))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            EvalOutcome::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&EvalError> {
        match self {
            EvalOutcome::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Collapse back to a storable value: `Null` becomes `Value::Null`,
    /// `Unset` and `Error` have no value.
    pub fn into_value(self) -> Option<Value> {
        match self {
            EvalOutcome::Value(v) => Some(v),
            EvalOutcome::Null => Some(Value::Null),
            EvalOutcome::Unset | EvalOutcome::Error(_) => None,
        }
    }

    /// Error for an argument that was `Unset` or `Error`, keeping the original
    /// error when there is one.
    pub(crate) fn as_argument_error(&self, function: &'static str) -> Option<EvalError> {
        match self {
            EvalOutcome::Error(e) => Some(e.clone()),
            EvalOutcome::Unset => Some(EvalError::UnsetArgument { function }),
            _ => None,
        }
    }
}

impl From<Value> for EvalOutcome {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => EvalOutcome::Null,
            other => EvalOutcome::Value(other),
        }
    }
}

impl From<EvalError> for EvalOutcome {
    fn from(error: EvalError) -> Self {
        EvalOutcome::Error(error)
    }
}

impl From<Result<Value, EvalError>> for EvalOutcome {
    fn from(result: Result<Value, EvalError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(e) => EvalOutcome::Error(e),
        }
    }
}
