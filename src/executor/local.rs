//! Local executor for document pipelines.
//!
//! Runs pipelines against a DocumentSource without requiring a server
//! connection. Stages apply strictly in declaration order over a batch that
//! starts in document-key order, so an `Offset` or `Limit` ahead of a `Sort`
//! cuts by key and a later `Sort` replaces an earlier one.

use tracing::{debug, trace};

use crate::ast::{Expression, Pipeline, Source, Stage};
use crate::model::{Document, ResourcePath};

use super::order::SortComparator;
use super::{DocumentSource, EvalConfig, EvalOutcome, Evaluator};

/// Local executor for document pipelines.
///
/// Executes pipelines against any DocumentSource implementation.
pub struct LocalExecutor<D: DocumentSource> {
    source: D,
    evaluator: Evaluator,
}

impl<D: DocumentSource> LocalExecutor<D> {
    /// Create a new executor with the given document source.
    pub fn new(source: D) -> Self {
        Self {
            source,
            evaluator: Evaluator::new(),
        }
    }

    /// Create a new executor with custom evaluator limits.
    pub fn with_config(source: D, config: EvalConfig) -> Self {
        Self {
            source,
            evaluator: Evaluator::with_config(config),
        }
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut D {
        &mut self.source
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Execute a pipeline.
    ///
    /// # Returns
    /// Matching documents in final stage order
    pub fn execute(&self, pipeline: &Pipeline) -> Vec<Document> {
        let documents = self.fetch(pipeline.source());
        execute_stages(pipeline, documents, &self.evaluator)
    }

    /// Whether one document survives the pipeline's source and filters.
    pub fn matches(&self, pipeline: &Pipeline, document: &Document) -> bool {
        document_matches(pipeline, document, &self.evaluator)
    }

    fn fetch(&self, source: &Source) -> Vec<Document> {
        match source {
            Source::Collection(path) => self.source.scan_collection(path),
            Source::CollectionGroup(collection_id) => {
                self.source.scan_collection_group(collection_id)
            }
            Source::Database => self.source.scan_all(),
            Source::Documents(keys) => keys.iter().filter_map(|k| self.source.get(k)).collect(),
        }
    }
}

/// Run a pipeline over already materialized documents with default limits.
pub fn run_pipeline<I>(pipeline: &Pipeline, documents: I) -> Vec<Document>
where
    I: IntoIterator<Item = Document>,
{
    execute_stages(pipeline, documents, &Evaluator::default())
}

impl Pipeline {
    /// Whether `document` passes the source and every `Where` stage.
    ///
    /// Ordering stages are ignored, so a matching document may still fall
    /// outside a limited result.
    pub fn matches(&self, document: &Document) -> bool {
        document_matches(self, document, &Evaluator::default())
    }
}

/// Whether a source admits a document key.
pub(crate) fn source_admits(source: &Source, key: &ResourcePath) -> bool {
    match source {
        Source::Collection(collection) => key.is_immediate_child_of(collection),
        Source::CollectionGroup(collection_id) => {
            key.collection_id() == Some(collection_id.as_str())
        }
        Source::Database => key.is_document_key(),
        Source::Documents(keys) => keys.contains(key),
    }
}

fn document_matches(pipeline: &Pipeline, document: &Document, evaluator: &Evaluator) -> bool {
    source_admits(pipeline.source(), document.key())
        && pipeline.stages().iter().all(|stage| match stage {
            Stage::Where(condition) => evaluator.evaluate(condition, document).is_true(),
            _ => true,
        })
}

fn execute_stages<I>(pipeline: &Pipeline, documents: I, evaluator: &Evaluator) -> Vec<Document>
where
    I: IntoIterator<Item = Document>,
{
    let source = pipeline.source();
    let mut current: Vec<Document> = documents
        .into_iter()
        .filter(|doc| source_admits(source, doc.key()))
        .collect();
    // Implicit key order; the first copy of a duplicated key wins.
    current.sort_by(|a, b| a.key().cmp(b.key()));
    current.dedup_by(|later, earlier| later.key() == earlier.key());
    debug!(stage = pipeline.stages()[0].name(), output = current.len(), "pipeline source");

    for stage in &pipeline.stages()[1..] {
        let input = current.len();
        current = match stage {
            Stage::Where(condition) => apply_where(current, condition, evaluator),
            Stage::Sort(keys) => SortComparator::new(keys, evaluator).sort(current),
            Stage::Offset(count) => apply_offset(current, *count),
            Stage::Limit(count) => apply_limit(current, *count),
            Stage::Source(_) => current,
        };
        debug!(stage = stage.name(), input, output = current.len(), "pipeline stage");
    }
    current
}

fn apply_where(
    documents: Vec<Document>,
    condition: &Expression,
    evaluator: &Evaluator,
) -> Vec<Document> {
    documents
        .into_iter()
        .filter(|doc| match evaluator.evaluate(condition, doc) {
            EvalOutcome::Error(error) => {
                trace!(document = %doc.key(), %error, "where predicate failed");
                false
            }
            outcome => outcome.is_true(),
        })
        .collect()
}

fn apply_offset(mut documents: Vec<Document>, count: usize) -> Vec<Document> {
    documents.drain(..count.min(documents.len()));
    documents
}

fn apply_limit(mut documents: Vec<Document>, count: usize) -> Vec<Document> {
    documents.truncate(count);
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SortKey;
    use crate::executor::InMemoryDocumentStore;
    use serde_json::json;

    fn create_test_executor() -> LocalExecutor<InMemoryDocumentStore> {
        let mut store = InMemoryDocumentStore::new();
        for (path, data) in [
            ("users/1", json!({"name": "Alice", "age": 30, "city": "NYC"})),
            ("users/2", json!({"name": "Bob", "age": 25, "city": "LA"})),
            ("users/3", json!({"name": "Charlie", "age": 35, "city": "NYC"})),
            ("users/1/orders/o1", json!({"amount": 100})),
            ("users/2/orders/o2", json!({"amount": 200})),
            ("orders/o3", json!({"amount": 150})),
            ("users-other/9", json!({"name": "Mallory", "age": 99})),
        ] {
            store.insert_json(path, data).unwrap();
        }
        LocalExecutor::new(store)
    }

    fn field(path: &str) -> Expression {
        Expression::field(path).unwrap()
    }

    fn call(name: &str, args: Vec<Expression>) -> Expression {
        Expression::call(name, args).unwrap()
    }

    fn keys(docs: &[Document]) -> Vec<String> {
        docs.iter().map(|d| d.key().to_string()).collect()
    }

    #[test]
    fn test_collection_source() {
        let executor = create_test_executor();
        let results = executor.execute(&Pipeline::collection("users").unwrap());
        assert_eq!(keys(&results), vec!["users/1", "users/2", "users/3"]);
    }

    #[test]
    fn test_subcollection_source() {
        let executor = create_test_executor();
        let results = executor.execute(&Pipeline::collection("users/1/orders").unwrap());
        assert_eq!(keys(&results), vec!["users/1/orders/o1"]);
    }

    #[test]
    fn test_collection_group_source() {
        let executor = create_test_executor();
        let results = executor.execute(&Pipeline::collection_group("orders").unwrap());
        assert_eq!(
            keys(&results),
            vec!["orders/o3", "users/1/orders/o1", "users/2/orders/o2"]
        );
    }

    #[test]
    fn test_database_and_documents_sources() {
        let executor = create_test_executor();
        assert_eq!(executor.execute(&Pipeline::database()).len(), 7);
        let pipeline = Pipeline::documents(&["users/3", "users/1", "users/404"]).unwrap();
        assert_eq!(keys(&executor.execute(&pipeline)), vec!["users/1", "users/3"]);
    }

    #[test]
    fn test_filter_query() {
        let executor = create_test_executor();
        let pipeline = Pipeline::collection("users")
            .unwrap()
            .filter(call("gt", vec![field("age"), Expression::constant(28i64)]));
        assert_eq!(keys(&executor.execute(&pipeline)), vec!["users/1", "users/3"]);
    }

    #[test]
    fn test_sort_query() {
        let executor = create_test_executor();
        let pipeline = Pipeline::collection("users")
            .unwrap()
            .sort(vec![SortKey::descending(field("age"))]);
        assert_eq!(
            keys(&executor.execute(&pipeline)),
            vec!["users/3", "users/1", "users/2"]
        );
    }

    #[test]
    fn test_limit_query() {
        let executor = create_test_executor();
        let pipeline = Pipeline::collection("users").unwrap().limit(2);
        assert_eq!(keys(&executor.execute(&pipeline)), vec!["users/1", "users/2"]);
        let pipeline = Pipeline::collection("users").unwrap().limit(0);
        assert!(executor.execute(&pipeline).is_empty());
    }

    #[test]
    fn test_limit_before_sort_uses_key_order() {
        let docs = vec![
            Document::from_json("c/c", json!({"age": 50})).unwrap(),
            Document::from_json("c/a", json!({"age": 40})).unwrap(),
            Document::from_json("c/b", json!({"age": 30})).unwrap(),
        ];
        let pipeline = Pipeline::collection("c")
            .unwrap()
            .limit(1)
            .sort(vec![SortKey::ascending(field("age"))]);
        assert_eq!(keys(&run_pipeline(&pipeline, docs)), vec!["c/a"]);
    }

    #[test]
    fn test_offset_query() {
        let executor = create_test_executor();
        let pipeline = Pipeline::collection("users").unwrap().offset(1);
        assert_eq!(keys(&executor.execute(&pipeline)), vec!["users/2", "users/3"]);
        let pipeline = Pipeline::collection("users").unwrap().offset(5);
        assert!(executor.execute(&pipeline).is_empty());
    }

    #[test]
    fn test_offset_before_sort_uses_key_order() {
        let docs = vec![
            Document::from_json("c/c", json!({"age": 50})).unwrap(),
            Document::from_json("c/a", json!({"age": 40})).unwrap(),
            Document::from_json("c/b", json!({"age": 30})).unwrap(),
        ];
        let pipeline = Pipeline::collection("c")
            .unwrap()
            .offset(1)
            .sort(vec![SortKey::ascending(field("age"))]);
        assert_eq!(keys(&run_pipeline(&pipeline, docs)), vec!["c/b", "c/c"]);
    }

    #[test]
    fn test_later_sort_replaces_earlier() {
        let executor = create_test_executor();
        let pipeline = Pipeline::collection("users")
            .unwrap()
            .sort(vec![SortKey::ascending(field("age"))])
            .sort(vec![SortKey::ascending(field("city"))]);
        assert_eq!(
            keys(&executor.execute(&pipeline)),
            vec!["users/2", "users/1", "users/3"]
        );
    }

    #[test]
    fn test_erroring_filter_excludes_only_that_document() {
        let docs = vec![
            Document::from_json("c/a", json!({"n": 1})).unwrap(),
            Document::from_json("c/b", json!({"n": 0})).unwrap(),
            Document::from_json("c/c", json!({"n": 4})).unwrap(),
        ];
        let ratio = call("divide", vec![Expression::constant(8i64), field("n")]);
        let pipeline = Pipeline::collection("c")
            .unwrap()
            .filter(call("gte", vec![ratio, Expression::constant(2i64)]));
        assert_eq!(keys(&run_pipeline(&pipeline, docs)), vec!["c/a", "c/c"]);
    }

    #[test]
    fn test_run_pipeline_filters_by_source() {
        let docs = vec![
            Document::from_json("users/b", json!({})).unwrap(),
            Document::from_json("rooms/r1/users/a", json!({})).unwrap(),
            Document::from_json("users-other/c", json!({})).unwrap(),
            Document::from_json("users/a", json!({})).unwrap(),
        ];
        let pipeline = Pipeline::collection("users").unwrap();
        assert_eq!(
            keys(&run_pipeline(&pipeline, docs.clone())),
            vec!["users/a", "users/b"]
        );
        let pipeline = Pipeline::collection_group("users").unwrap();
        assert_eq!(
            keys(&run_pipeline(&pipeline, docs)),
            vec!["rooms/r1/users/a", "users/a", "users/b"]
        );
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let docs = vec![
            Document::from_json("c/a", json!({"v": 1})).unwrap(),
            Document::from_json("c/a", json!({"v": 2})).unwrap(),
        ];
        let results = run_pipeline(&Pipeline::collection("c").unwrap(), docs);
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].get_field(&crate::model::FieldPath::parse("v").unwrap()),
            Some(&crate::model::Value::Integer(1))
        );
    }

    #[test]
    fn test_matches() {
        let executor = create_test_executor();
        let pipeline = Pipeline::collection("users")
            .unwrap()
            .filter(call("eq", vec![field("city"), Expression::constant("NYC")]))
            .limit(1);
        let alice = Document::from_json("users/1", json!({"city": "NYC"})).unwrap();
        let bob = Document::from_json("users/2", json!({"city": "LA"})).unwrap();
        let elsewhere = Document::from_json("people/1", json!({"city": "NYC"})).unwrap();
        assert!(pipeline.matches(&alice));
        assert!(!pipeline.matches(&bob));
        assert!(!pipeline.matches(&elsewhere));
        assert!(executor.matches(&pipeline, &alice));
    }

    #[test]
    fn test_with_config() {
        let mut store = InMemoryDocumentStore::new();
        store.insert_json("c/a", json!({"s": "hello"})).unwrap();
        let executor = LocalExecutor::with_config(store, EvalConfig::mobile());
        assert_eq!(executor.evaluator().config(), &EvalConfig::mobile());
        let pipeline = Pipeline::collection("c").unwrap().filter(call(
            "regex_contains",
            vec![field("s"), Expression::constant("l+")],
        ));
        assert_eq!(executor.execute(&pipeline).len(), 1);
    }
}
