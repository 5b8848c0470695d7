//! Decoding of trigger arguments and encoding of return values
//!
//! The Functions host hands every binding value to a custom handler as JSON. Depending on the
//! extension version, a Cosmos DB batch arrives either as a JSON array or as a string that
//! contains the serialized array, so extractors accept both.

use serde_json::Value;

use crate::{Error, FunctionResult};

/// Trigger argument extractor
pub trait Extract: Sized {
    /// Convert from a binding value to a value
    fn extract(payload: Value) -> FunctionResult<Self>;
}

impl Extract for Value {
    fn extract(payload: Value) -> FunctionResult<Self> {
        Ok(payload)
    }
}

impl Extract for Vec<Value> {
    fn extract(payload: Value) -> FunctionResult<Self> {
        match unwrap_string_encoded(payload)? {
            Value::Array(values) => Ok(values),
            other => Err(Error::ExtractError(format!(
                "expected a list of documents, got {}",
                kind(&other)
            ))),
        }
    }
}

/// A value which can be returned to the host as the invocation's `ReturnValue`
pub trait Payload {
    /// Convert the value to JSON
    fn try_serialize(self) -> FunctionResult<Value>;
}

impl Payload for () {
    fn try_serialize(self) -> FunctionResult<Value> {
        Ok(Value::Null)
    }
}
impl Payload for Value {
    fn try_serialize(self) -> FunctionResult<Value> {
        Ok(self)
    }
}
impl Payload for String {
    fn try_serialize(self) -> FunctionResult<Value> {
        Ok(Value::String(self))
    }
}
impl Payload for &str {
    fn try_serialize(self) -> FunctionResult<Value> {
        Ok(Value::String(self.to_string()))
    }
}

/// JSON encoding and decoding
pub struct Json<T>(pub T);
impl<T: serde::de::DeserializeOwned> Extract for Json<T> {
    fn extract(payload: Value) -> FunctionResult<Self> {
        Ok(Json(serde_json::from_value(unwrap_string_encoded(payload)?)?))
    }
}
impl<T: serde::Serialize> Payload for Json<T> {
    fn try_serialize(self) -> FunctionResult<Value> {
        serde_json::to_value(&self.0)
            .map_err(|e| Error::MessageError(format!("failed to serialize json: {e}")))
    }
}

/// Parses a binding value that the host delivered as a JSON string.
///
/// Values that are not strings are returned unchanged.
pub fn unwrap_string_encoded(payload: Value) -> FunctionResult<Value> {
    match payload {
        Value::String(encoded) => Ok(serde_json::from_str(&encoded)?),
        other => Ok(other),
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_accepts_array_and_string_encoded_array() {
        let direct = Vec::<Value>::extract(json!([{"id": "a"}, {"id": "b"}])).unwrap();
        let encoded =
            Vec::<Value>::extract(Value::String(r#"[{"id":"a"},{"id":"b"}]"#.to_string())).unwrap();
        assert_eq!(direct, encoded);
        assert_eq!(direct.len(), 2);
    }

    #[test]
    fn list_rejects_null() {
        let error = Vec::<Value>::extract(Value::Null).unwrap_err();
        assert!(error.to_string().contains("got null"), "{error}");
    }

    #[test]
    fn list_rejects_garbage_string() {
        assert!(matches!(
            Vec::<Value>::extract(Value::String("not json".to_string())),
            Err(Error::ExtractError(_))
        ));
    }

    #[test]
    fn typed_json_reads_string_encoded_values() {
        #[derive(serde::Deserialize)]
        struct Item {
            id: String,
        }
        let Json(items) =
            Json::<Vec<Item>>::extract(Value::String(r#"[{"id":"x"}]"#.to_string())).unwrap();
        assert_eq!(items[0].id, "x");
    }

    #[test]
    fn unit_serializes_to_null() {
        assert_eq!(().try_serialize().unwrap(), Value::Null);
    }
}
