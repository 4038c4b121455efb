//! Expression evaluation against a single document.

use crate::ast::{Expression, Function, FunctionFamily};
use crate::error::EvalError;
use crate::model::{Document, FieldPath, Value};

use super::builtins::{self, logical};
use super::{EvalConfig, EvalOutcome};

/// Evaluates expression trees. Holds only configuration, so one evaluator can
/// be shared across any number of documents.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    /// Create an evaluator with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an evaluator with custom limits.
    pub fn with_config(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluate `expression` against `document`. Never fails: domain
    /// violations come back as `EvalOutcome::Error`.
    pub fn evaluate(&self, expression: &Expression, document: &Document) -> EvalOutcome {
        match expression {
            Expression::Field(path) => field_value(path, document),
            Expression::Literal(value) => value.clone().into(),
            Expression::Function { function, args } => self.call(*function, args, document),
        }
    }

    fn call(&self, function: Function, args: &[Expression], document: &Document) -> EvalOutcome {
        // Trees built through `Expression::function` are already checked;
        // deserialized ones may not be.
        let arity = function.arity();
        if !arity.accepts(args.len()) {
            return EvalError::Arity {
                function: function.name(),
                expected: arity.to_string(),
                actual: args.len(),
            }
            .into();
        }

        if function.family() == FunctionFamily::Logical {
            return logical::call(function, args, |arg| self.evaluate(arg, document));
        }

        let evaluated = args
            .iter()
            .map(|arg| self.evaluate(arg, document))
            .collect();
        builtins::dispatch(function, evaluated, &self.config)
    }
}

/// Field lookup. `__name__` resolves to a reference to the document itself.
fn field_value(path: &FieldPath, document: &Document) -> EvalOutcome {
    if path.is_document_id() {
        return EvalOutcome::Value(Value::Reference(document.key().clone()));
    }
    match document.get_field(path) {
        Some(value) => value.clone().into(),
        None => EvalOutcome::Unset,
    }
}

/// Evaluate with default limits.
pub fn evaluate(expression: &Expression, document: &Document) -> EvalOutcome {
    Evaluator::default().evaluate(expression, document)
}
