//! Error types for docpipe.
//!
//! Two families live here. `PipelineError` covers construction-time problems
//! (bad paths, unknown functions, malformed pipelines) and is returned through
//! `PipelineResult`. `EvalError` describes a domain violation observed while
//! evaluating an expression; it never escapes as a Rust error and is carried
//! inside `EvalOutcome::Error` instead.

use thiserror::Error;

/// Construction-time error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid field path: {0}")]
    InvalidFieldPath(String),

    #[error("Invalid document path: {0}")]
    InvalidDocumentPath(String),

    #[error("Invalid collection path: {0}")]
    InvalidCollectionPath(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function {function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),
}

/// Result type for construction-time operations
pub type PipelineResult<T> = Result<T, PipelineError>;

impl serde::Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Reason an expression evaluated to an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{function}: argument is not set")]
    UnsetArgument { function: &'static str },

    #[error("{function}: expected {expected}, found {found}")]
    TypeMismatch {
        function: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{function}: division by zero")]
    DivisionByZero { function: &'static str },

    #[error("{function}: integer overflow")]
    Overflow { function: &'static str },

    #[error("{function}: timestamp out of range")]
    TimestampOutOfRange { function: &'static str },

    #[error("{function}: vector dimensions differ ({left} vs {right})")]
    DimensionMismatch {
        function: &'static str,
        left: usize,
        right: usize,
    },

    #[error("{function}: vector has zero magnitude")]
    ZeroMagnitude { function: &'static str },

    #[error("{function}: invalid regular expression: {reason}")]
    InvalidRegex {
        function: &'static str,
        reason: String,
    },

    #[error("{function}: invalid argument: {reason}")]
    InvalidArgument {
        function: &'static str,
        reason: String,
    },

    #[error("{function}: expected {expected} argument(s), got {actual}")]
    Arity {
        function: &'static str,
        expected: String,
        actual: usize,
    },
}

impl EvalError {
    /// Name of the function that raised the error.
    pub fn function(&self) -> &'static str {
        match self {
            EvalError::UnsetArgument { function }
            | EvalError::TypeMismatch { function, .. }
            | EvalError::DivisionByZero { function }
            | EvalError::Overflow { function }
            | EvalError::TimestampOutOfRange { function }
            | EvalError::DimensionMismatch { function, .. }
            | EvalError::ZeroMagnitude { function }
            | EvalError::InvalidRegex { function, .. }
            | EvalError::InvalidArgument { function, .. }
            | EvalError::Arity { function, .. } => function,
        }
    }
}

impl serde::Serialize for EvalError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
