use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::BadRequest,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// [`ApiError`] as a `std::error::Error`, for callers that propagate it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

/// Error body returned by the decisions API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Flattens `detail` into one message.
    ///
    /// `detail` is either a plain string or, for request validation failures, a
    /// list of `{loc, msg, type}` objects whose messages are joined with `"; "`.
    pub fn message(&self) -> Option<String> {
        detail_message(self.detail.as_ref()?)
    }
}

pub fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Array(items) => {
            let messages: Vec<String> = items.iter().filter_map(validation_item_message).collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        Value::Object(map) => map
            .get("msg")
            .or_else(|| map.get("message"))
            .and_then(detail_message),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn validation_item_message(item: &Value) -> Option<String> {
    let Value::Object(map) = item else {
        return detail_message(item);
    };
    let msg = map.get("msg").and_then(Value::as_str)?;
    let field = map
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.iter().rev().find_map(Value::as_str))
        .filter(|field| !matches!(*field, "body" | "query" | "path"));
    Some(match field {
        Some(field) => format!("{field}: {msg}"),
        None => msg.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
