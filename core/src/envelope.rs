//! The `{data, links}` / `{error_message}` wrapper around every payload.
//!
//! Navigation `links` are accepted on the wire but not decoded; paging is
//! done client-side over the full collection.
//!
//! # Design
//! A response is parsed once into a loosely-typed envelope. The error field is
//! inspected first, so an error envelope wins even when `data` is present,
//! and only then is `data` decoded into the caller's type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Outgoing wrapper: `{"data": <payload>}`.
#[derive(Debug, Serialize)]
pub struct RequestEnvelope<'a, T> {
    pub data: &'a T,
}

/// Incoming wrapper before `data` has been given a type.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResponseEnvelope {
    pub data: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

pub fn encode<T: Serialize>(data: &T) -> ApiResult<String> {
    serde_json::to_string(&RequestEnvelope { data }).map_err(ApiError::Serialization)
}

/// Decode a response body into its `data` payload.
///
/// An empty body, or a `data` that is absent or `null`, yields `Ok(None)`.
pub fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<Option<T>> {
    if body.is_empty() {
        return Ok(None);
    }
    let envelope: ResponseEnvelope =
        serde_json::from_str(body).map_err(ApiError::MalformedResponse)?;
    if let Some(message) = envelope.error_message.filter(|m| !m.is_empty()) {
        return Err(ApiError::Downstream(message));
    }
    match envelope.data {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(data) => serde_json::from_value(data)
            .map(Some)
            .map_err(ApiError::MalformedResponse),
    }
}
