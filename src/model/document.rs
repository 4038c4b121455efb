//! Documents as seen by the evaluator.

use serde::{Deserialize, Serialize};

use super::path::{FieldPath, ResourcePath};
use super::value::{MapValue, Timestamp, Value};
use crate::error::{PipelineError, PipelineResult};

/// A decoded document: its full key, its fields and an opaque update time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    key: ResourcePath,
    data: MapValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    update_time: Option<Timestamp>,
}

#[derive(Deserialize)]
struct RawDocument {
    key: ResourcePath,
    data: MapValue,
    #[serde(default)]
    update_time: Option<Timestamp>,
}

impl TryFrom<RawDocument> for Document {
    type Error = PipelineError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let document = Document::new(raw.key, raw.data)?;
        Ok(match raw.update_time {
            Some(update_time) => document.with_update_time(update_time),
            None => document,
        })
    }
}

impl Document {
    /// Create a document. `key` must name a document (even segment count).
    pub fn new(key: ResourcePath, data: MapValue) -> PipelineResult<Self> {
        if !key.is_document_key() {
            return Err(PipelineError::InvalidDocumentPath(key.to_string()));
        }
        Ok(Self {
            key,
            data,
            update_time: None,
        })
    }

    /// Build a document from a slash path and a JSON object.
    pub fn from_json(path: &str, json: serde_json::Value) -> PipelineResult<Self> {
        let key = ResourcePath::document(path)?;
        match Value::from_json(json) {
            Value::Map(data) => Self::new(key, data),
            other => Err(PipelineError::UnsupportedValue(format!(
                "document data must be a map, found {}",
                other.kind_name()
            ))),
        }
    }

    pub fn with_update_time(mut self, update_time: Timestamp) -> Self {
        self.update_time = Some(update_time);
        self
    }

    pub fn key(&self) -> &ResourcePath {
        &self.key
    }

    pub fn data(&self) -> &MapValue {
        &self.data
    }

    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    /// Id of the collection this document belongs to.
    pub fn collection_id(&self) -> Option<&str> {
        self.key.collection_id()
    }

    /// Look up a nested field. `None` if any segment is missing or an
    /// intermediate value is not a map.
    pub fn get_field(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.data.get(first)?;
        for segment in rest {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }
}
