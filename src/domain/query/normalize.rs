//! Classification of raw backend responses.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::request::RawResponse;
use crate::domain::foundation::{DataError, DataResult};

/// Message of the protocol error raised for a response that is neither success nor error.
pub const UNDETERMINED: &str = "undetermined query result";

/// Turns a raw response into a `DataResult`.
///
/// 1. structured `data` (object or array) wins, even if an error is also present
/// 2. otherwise a present `error` is returned unchanged
/// 3. otherwise the response is a protocol violation, carried as context
pub fn normalize(response: RawResponse) -> DataResult<Value> {
    match response {
        RawResponse {
            data: Some(data @ (Value::Object(_) | Value::Array(_))),
            ..
        } => Ok(data),
        RawResponse {
            error: Some(error), ..
        } => Err(DataError::Backend(error)),
        other => {
            let context = serde_json::to_value(&other).unwrap_or(Value::Null);
            Err(DataError::protocol(UNDETERMINED, context))
        }
    }
}

/// Deserializes a normalized value into the requested shape.
pub fn decode<T: DeserializeOwned>(value: Value) -> DataResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| {
        DataError::protocol(format!("response does not match projection: {}", e), value)
    })
}
