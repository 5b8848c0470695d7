use cosmosdb_functions_host::FunctionResult;
use cosmosdb_functions_host::encoding::{Json, Payload};
use serde::Serialize;
use serde_json::Value;

/// Values returned by a trigger handler must implement this trait.
///
/// Implementations are provided for
/// - [()]: The usual change feed handler, which has nothing to return.
/// - [String], [&str] and [serde_json::Value]: Sent to the host as the `ReturnValue`.
/// - [Json]: Serialized and sent as the `ReturnValue`.
/// - `Result<impl TriggerResponse, E>`: Errors fail the invocation, so the host applies its
///   retry policy. The error's message is added to the invocation's logs.
pub trait TriggerResponse {
    fn into_return_value(self) -> FunctionResult<Value>;
}

impl TriggerResponse for () {
    fn into_return_value(self) -> FunctionResult<Value> {
        self.try_serialize()
    }
}

impl TriggerResponse for String {
    fn into_return_value(self) -> FunctionResult<Value> {
        self.try_serialize()
    }
}

impl TriggerResponse for &str {
    fn into_return_value(self) -> FunctionResult<Value> {
        self.try_serialize()
    }
}

impl TriggerResponse for Value {
    fn into_return_value(self) -> FunctionResult<Value> {
        self.try_serialize()
    }
}

impl<T: Serialize> TriggerResponse for Json<T> {
    fn into_return_value(self) -> FunctionResult<Value> {
        self.try_serialize()
    }
}

impl<R, E> TriggerResponse for Result<R, E>
where
    R: TriggerResponse,
    E: std::fmt::Display,
{
    fn into_return_value(self) -> FunctionResult<Value> {
        match self {
            Ok(r) => r.into_return_value(),
            Err(e) => Err(cosmosdb_functions_host::Error::message(e.to_string())),
        }
    }
}
