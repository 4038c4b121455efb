//! Document data model: values, paths and documents.

mod document;
mod path;
mod value;

pub use document::Document;
pub use path::{FieldPath, ResourcePath, DOCUMENT_ID_FIELD};
pub use value::{GeoPoint, MapValue, Timestamp, TypeOrder, Value};
