//! The custom handler invocation exchange
//!
//! For every trigger event the Functions host sends a `POST /{function_name}` with an
//! [InvocationRequest] body and expects an [InvocationResponse] back. Only HTTP 200 counts as
//! success; anything else is a failed execution, subject to the host's retry policy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An invocation forwarded by the Functions host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationRequest {
    /// Binding values keyed by binding name. The trigger's documents live under its argument name.
    #[serde(default)]
    pub data: HashMap<String, Value>,
    /// Trigger metadata, including the host's `sys` block.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl InvocationRequest {
    /// Builds a request carrying a single trigger argument.
    pub fn with_argument(argument: impl Into<String>, value: Value) -> Self {
        Self {
            data: HashMap::from([(argument.into(), value)]),
            metadata: HashMap::new(),
        }
    }

    /// Removes and returns the value bound to `argument`.
    pub fn take_argument(&mut self, argument: &str) -> Option<Value> {
        self.data.remove(argument)
    }

    /// The host's `sys` metadata. Missing or unexpected shapes read as empty.
    pub fn system_metadata(&self) -> SystemMetadata {
        self.metadata
            .get("sys")
            .cloned()
            .and_then(|sys| serde_json::from_value(sys).ok())
            .unwrap_or_default()
    }
}

/// Per-invocation information the host attaches under `Metadata.sys`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemMetadata {
    method_name: Option<String>,
    utc_now: Option<String>,
    rand_guid: Option<String>,
}

impl SystemMetadata {
    /// The name of the function being invoked.
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// The host's clock at dispatch time.
    pub fn utc_now(&self) -> Option<&str> {
        self.utc_now.as_deref()
    }

    /// A random id the host generates for this invocation.
    pub fn rand_guid(&self) -> Option<&str> {
        self.rand_guid.as_deref()
    }
}

/// The body a custom handler answers an invocation with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationResponse {
    /// Output binding values. A change feed trigger has none.
    #[serde(default)]
    pub outputs: HashMap<String, Value>,
    /// Lines the host writes to the invocation's log.
    #[serde(default)]
    pub logs: Vec<String>,
    /// The function's return value.
    #[serde(default)]
    pub return_value: Value,
}

impl InvocationResponse {
    /// Creates an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log lines.
    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = logs;
        self
    }

    /// Sets the return value.
    pub fn with_return_value(mut self, return_value: Value) -> Self {
        self.return_value = return_value;
        self
    }
}

/// A failed invocation, carrying the HTTP status and the response body to send to the host.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct InvocationError {
    status: u16,
    message: String,
    response: InvocationResponse,
}

impl InvocationError {
    /// The host sent something the function cannot accept. HTTP 400.
    pub fn bad_request(message: impl Into<String>, logs: Vec<String>) -> Self {
        Self::new(400, message.into(), logs)
    }

    /// The function ran and failed. HTTP 500.
    pub fn failed(message: impl Into<String>, logs: Vec<String>) -> Self {
        Self::new(500, message.into(), logs)
    }

    fn new(status: u16, message: String, mut logs: Vec<String>) -> Self {
        logs.push(message.clone());
        Self {
            status,
            message,
            response: InvocationResponse::new().with_logs(logs),
        }
    }

    /// The HTTP status for this failure.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The response body, whose last log line is the failure message.
    pub fn response(&self) -> &InvocationResponse {
        &self.response
    }

    /// Takes the response body.
    pub fn into_response(self) -> InvocationResponse {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_host_request() {
        let request: InvocationRequest = serde_json::from_value(json!({
            "Data": { "azcosmosdb": [{"id": "1"}] },
            "Metadata": {
                "sys": {
                    "MethodName": "cosmosdb_trigger",
                    "UtcNow": "2024-01-01T00:00:00Z",
                    "RandGuid": "0f8fad5b-d9cb-469f-a165-70867728950e"
                }
            }
        }))
        .unwrap();

        let sys = request.system_metadata();
        assert_eq!(sys.method_name(), Some("cosmosdb_trigger"));
        assert_eq!(sys.utc_now(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(sys.rand_guid(), Some("0f8fad5b-d9cb-469f-a165-70867728950e"));
        assert_eq!(request.data["azcosmosdb"], json!([{"id": "1"}]));
    }

    #[test]
    fn missing_sections_default() {
        let request: InvocationRequest = serde_json::from_str("{}").unwrap();
        assert!(request.data.is_empty());
        assert_eq!(request.system_metadata(), SystemMetadata::default());
    }

    #[test]
    fn response_uses_host_field_names() {
        let response = InvocationResponse::new().with_logs(vec!["hello".to_string()]);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Outputs": {}, "Logs": ["hello"], "ReturnValue": null})
        );
    }

    #[test]
    fn failure_appends_message_to_logs() {
        let error = InvocationError::failed("boom", vec!["before".to_string()]);
        assert_eq!(error.status(), 500);
        assert_eq!(error.to_string(), "boom");
        assert_eq!(error.into_response().logs, vec!["before", "boom"]);
    }
}
