//! Executor module for document pipelines.
//!
//! This module provides the expression evaluator, the sort/order engine and
//! a trait-based executor that can run pipelines against any store
//! implementing the DocumentSource trait.

mod builtins;
mod evaluate;
mod helpers;
mod local;
mod order;
mod outcome;

pub use evaluate::{evaluate, Evaluator};
pub use helpers::*;
pub use local::{run_pipeline, LocalExecutor};
pub use order::{compare_outcomes, SortComparator};
pub use outcome::EvalOutcome;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;
use crate::model::{Document, ResourcePath};

/// Trait for stores that can feed documents into a pipeline.
///
/// Implementations may return more documents than asked for; the executor
/// re-applies the source filter. Documents need not be returned in key order.
pub trait DocumentSource {
    /// Every document in the store.
    fn scan_all(&self) -> Vec<Document>;

    /// Get a single document by key.
    fn get(&self, key: &ResourcePath) -> Option<Document>;

    /// Documents stored directly under `collection`.
    fn scan_collection(&self, collection: &ResourcePath) -> Vec<Document> {
        self.scan_all()
            .into_iter()
            .filter(|doc| doc.key().is_immediate_child_of(collection))
            .collect()
    }

    /// Documents in any collection named `collection_id`, at any depth.
    fn scan_collection_group(&self, collection_id: &str) -> Vec<Document> {
        self.scan_all()
            .into_iter()
            .filter(|doc| doc.collection_id() == Some(collection_id))
            .collect()
    }
}

/// Evaluator limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum regex pattern length in characters (default: 1000)
    pub max_regex_pattern_len: usize,
    /// Maximum compiled regex size in bytes (default: 1MB)
    pub regex_size_limit: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_regex_pattern_len: 1000,
            regex_size_limit: 1024 * 1024, // 1MB
        }
    }
}

impl EvalConfig {
    /// Create limits suitable for mobile devices
    pub fn mobile() -> Self {
        Self {
            max_regex_pattern_len: 256,
            regex_size_limit: 256 * 1024, // 256KB
        }
    }

    /// Create limits suitable for desktop applications
    pub fn desktop() -> Self {
        Self {
            max_regex_pattern_len: 4000,
            regex_size_limit: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// In-memory document store, kept in key order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: BTreeMap<ResourcePath, Document>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn insert(&mut self, document: Document) {
        self.documents.insert(document.key().clone(), document);
    }

    /// Insert a document built from a slash path and a JSON object
    pub fn insert_json(&mut self, path: &str, data: serde_json::Value) -> PipelineResult<()> {
        self.insert(Document::from_json(path, data)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &ResourcePath) -> Option<Document> {
        self.documents.remove(key)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<Document> for InMemoryDocumentStore {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut store = Self::new();
        for document in iter {
            store.insert(document);
        }
        store
    }
}

impl DocumentSource for InMemoryDocumentStore {
    fn scan_all(&self) -> Vec<Document> {
        self.documents.values().cloned().collect()
    }

    fn get(&self, key: &ResourcePath) -> Option<Document> {
        self.documents.get(key).cloned()
    }

    fn scan_collection(&self, collection: &ResourcePath) -> Vec<Document> {
        // Children of `collection` sort directly after it; stop at the first
        // key outside the subtree.
        self.documents
            .range(collection.clone()..)
            .take_while(|(key, _)| key.segments().starts_with(collection.segments()))
            .filter(|(key, _)| key.is_immediate_child_of(collection))
            .map(|(_, doc)| doc.clone())
            .collect()
    }
}
