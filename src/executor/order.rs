//! Sort/order engine.
//!
//! Sort keys compare with "missing first" dense semantics: `Unset` (and
//! `Error`) sort below `Null`, which sorts below every value. Descending keys
//! reverse that order. The document key, ascending, always breaks ties.

use std::cmp::Ordering;

use crate::ast::{Direction, SortKey};
use crate::model::Document;

use super::helpers::compare_values;
use super::{EvalOutcome, Evaluator};

fn outcome_class(outcome: &EvalOutcome) -> u8 {
    match outcome {
        EvalOutcome::Unset | EvalOutcome::Error(_) => 0,
        EvalOutcome::Null => 1,
        EvalOutcome::Value(_) => 2,
    }
}

/// Ascending order over evaluated sort keys.
pub fn compare_outcomes(a: &EvalOutcome, b: &EvalOutcome) -> Ordering {
    match (a, b) {
        (EvalOutcome::Value(x), EvalOutcome::Value(y)) => compare_values(x, y),
        _ => outcome_class(a).cmp(&outcome_class(b)),
    }
}

/// Orders documents by a list of sort keys.
pub struct SortComparator<'a> {
    keys: &'a [SortKey],
    evaluator: &'a Evaluator,
}

impl<'a> SortComparator<'a> {
    pub fn new(keys: &'a [SortKey], evaluator: &'a Evaluator) -> Self {
        Self { keys, evaluator }
    }

    /// Evaluate every sort key for one document.
    pub fn evaluate_keys(&self, document: &Document) -> Vec<EvalOutcome> {
        self.keys
            .iter()
            .map(|key| self.evaluator.evaluate(&key.expression, document))
            .collect()
    }

    /// Compare two documents given their pre-evaluated keys.
    pub fn compare(
        &self,
        (left, left_keys): (&Document, &[EvalOutcome]),
        (right, right_keys): (&Document, &[EvalOutcome]),
    ) -> Ordering {
        for ((key, l), r) in self.keys.iter().zip(left_keys).zip(right_keys) {
            let ord = match key.direction {
                Direction::Ascending => compare_outcomes(l, r),
                Direction::Descending => compare_outcomes(r, l),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        left.key().cmp(right.key())
    }

    /// Sort documents, evaluating each key once per document.
    pub fn sort(&self, documents: Vec<Document>) -> Vec<Document> {
        let mut decorated: Vec<(Vec<EvalOutcome>, Document)> = documents
            .into_iter()
            .map(|doc| (self.evaluate_keys(&doc), doc))
            .collect();
        decorated.sort_by(|(lk, l), (rk, r)| {
            self.compare((l, lk.as_slice()), (r, rk.as_slice()))
        });
        decorated.into_iter().map(|(_, doc)| doc).collect()
    }
}
