use std::ops::Deref;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::encoding::{Extract, kind, unwrap_string_encoded};
use crate::{Error, FunctionResult};

/// A single changed document from the Cosmos DB change feed.
///
/// The content is whatever the container stores; the host adds the usual system properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// The document's `id`.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The `_rid` system property.
    pub fn resource_id(&self) -> Option<&str> {
        self.0.get("_rid").and_then(Value::as_str)
    }

    /// The `_etag` system property.
    pub fn etag(&self) -> Option<&str> {
        self.0.get("_etag").and_then(Value::as_str)
    }

    /// The `_ts` system property: last modification, in seconds since the unix epoch.
    pub fn timestamp(&self) -> Option<i64> {
        self.0.get("_ts").and_then(Value::as_i64)
    }

    /// The `_lsn` system property: the change feed's logical sequence number for this version.
    pub fn lsn(&self) -> Option<u64> {
        self.0.get("_lsn").and_then(Value::as_u64)
    }

    /// Looks up a top-level property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrows the raw properties.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Takes the raw properties.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Deserializes the document into your own type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> FunctionResult<T> {
        T::deserialize(&Value::Object(self.0.clone())).map_err(Into::into)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// The batch of changed documents delivered to a Cosmos DB trigger.
///
/// ```rust
/// use cosmosdb_functions_host::{DocumentList, encoding::Extract};
///
/// let documents = DocumentList::extract(serde_json::json!([{"id": "1"}, {"id": "2"}])).unwrap();
/// assert_eq!(documents.len(), 2);
/// assert_eq!(documents[0].id(), Some("1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentList(Vec<Document>);

impl DocumentList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the documents.
    pub fn into_vec(self) -> Vec<Document> {
        self.0
    }
}

impl Deref for DocumentList {
    type Target = [Document];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Document> for DocumentList {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DocumentList {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DocumentList {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extract for DocumentList {
    fn extract(payload: Value) -> FunctionResult<Self> {
        match unwrap_string_encoded(payload)? {
            Value::Array(values) => values
                .into_iter()
                .enumerate()
                .map(|(index, value)| match value {
                    Value::Object(map) => Ok(Document(map)),
                    other => Err(Error::ExtractError(format!(
                        "document {index} is {}, expected an object",
                        kind(&other)
                    ))),
                })
                .collect(),
            other => Err(Error::ExtractError(format!(
                "expected a list of documents, got {}",
                kind(&other)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_system_properties() {
        let documents = DocumentList::extract(json!([{
            "id": "order-1",
            "_rid": "AbCdAA==",
            "_etag": "\"0000d986-0000-0000-0000-000000000000\"",
            "_ts": 1_700_000_000,
            "_lsn": 42,
            "total": 10
        }]))
        .unwrap();
        let document = &documents[0];
        assert_eq!(document.id(), Some("order-1"));
        assert_eq!(document.resource_id(), Some("AbCdAA=="));
        assert!(document.etag().is_some());
        assert_eq!(document.timestamp(), Some(1_700_000_000));
        assert_eq!(document.lsn(), Some(42));
        assert_eq!(document.get("total"), Some(&json!(10)));
    }

    #[test]
    fn empty_batch_is_empty() {
        let documents = DocumentList::extract(json!([])).unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn string_encoded_batch() {
        let documents = DocumentList::extract(Value::String(r#"[{"id":"1"}]"#.into())).unwrap();
        assert_eq!(documents.len(), 1);
    }

    #[test]
    fn non_object_document_is_rejected() {
        let error = DocumentList::extract(json!([{"id": "1"}, 7])).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Failed to extract trigger argument: document 1 is a number, expected an object"
        );
    }

    #[test]
    fn deserializes_into_user_types() {
        #[derive(serde::Deserialize)]
        struct Order {
            id: String,
            total: u32,
        }
        let documents = DocumentList::extract(json!([{"id": "o", "total": 3}])).unwrap();
        let order: Order = documents[0].deserialize().unwrap();
        assert_eq!((order.id.as_str(), order.total), ("o", 3));
    }
}
