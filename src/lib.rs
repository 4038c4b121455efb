//! docpipe - Local document pipeline engine.
//!
//! This crate evaluates declarative pipelines (source, filter, sort, limit)
//! over locally available documents with the same answers a remote query
//! backend would give. It has no storage engine dependencies: documents come
//! from any `DocumentSource` implementation or a plain iterator.
//!
//! # Main Components
//!
//! - **Model**: Typed values, resource and field paths, documents
//! - **AST**: Expressions, functions and pipeline stages
//! - **Executor**: Expression evaluator, sort engine and pipeline executor
//!
//! # Example
//!
//! ```rust
//! use docpipe::{Expression, InMemoryDocumentStore, LocalExecutor, Pipeline, SortKey};
//! use serde_json::json;
//!
//! let mut store = InMemoryDocumentStore::new();
//! store.insert_json("users/1", json!({"name": "Alice", "age": 30})).unwrap();
//! store.insert_json("users/2", json!({"name": "Bob", "age": 25})).unwrap();
//! store.insert_json("users/3", json!({"name": "Carol"})).unwrap();
//!
//! let adults = Expression::call(
//!     "gte",
//!     vec![Expression::field("age").unwrap(), Expression::constant(26i64)],
//! )
//! .unwrap();
//! let pipeline = Pipeline::collection("users")
//!     .unwrap()
//!     .filter(adults)
//!     .sort(vec![SortKey::descending(Expression::field("age").unwrap())]);
//!
//! let executor = LocalExecutor::new(store);
//! let results = executor.execute(&pipeline);
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].key().to_string(), "users/1");
//! ```

pub mod ast;
pub mod error;
pub mod executor;
pub mod model;

// Re-export main types for convenience
pub use ast::{
    Arity, Direction, Expression, Function, FunctionFamily, Pipeline, SortKey, Source, Stage,
};
pub use error::{EvalError, PipelineError, PipelineResult};
pub use executor::{
    evaluate, run_pipeline, DocumentSource, EvalConfig, EvalOutcome, Evaluator,
    InMemoryDocumentStore, LocalExecutor, SortComparator,
};
pub use model::{Document, FieldPath, GeoPoint, MapValue, ResourcePath, Timestamp, Value};
